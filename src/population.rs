//! Container of the schools and background resources of a run.

use bioen_core::errors::{BioenError, BioenResult};
use bioen_core::prey::{PreyId, PreyPool};
use bioen_core::resource::Resource;
use bioen_core::school::School;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Population {
    schools: Vec<School>,
    resources: Vec<Resource>,
}

impl Population {
    pub fn new(schools: Vec<School>, resources: Vec<Resource>) -> Self {
        Self { schools, resources }
    }

    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    pub fn schools_mut(&mut self) -> &mut [School] {
        &mut self.schools
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Resource biomass is forcing: callers set it with
    /// [`Resource::begin_step`] before each time step.
    pub fn resources_mut(&mut self) -> &mut [Resource] {
        &mut self.resources
    }

    pub fn school(&self, index: usize) -> BioenResult<&School> {
        self.schools.get(index).ok_or(BioenError::UnknownSchool {
            index,
            n_schools: self.schools.len(),
        })
    }

    pub fn school_mut(&mut self, index: usize) -> BioenResult<&mut School> {
        let n_schools = self.schools.len();
        self.schools
            .get_mut(index)
            .ok_or(BioenError::UnknownSchool { index, n_schools })
    }

    pub fn add_school(&mut self, school: School) {
        self.schools.push(school);
    }

    pub fn extend_schools(&mut self, schools: impl IntoIterator<Item = School>) {
        self.schools.extend(schools);
    }

    pub fn prey(&self, id: PreyId) -> BioenResult<&dyn PreyPool> {
        match id {
            PreyId::School(i) => self.schools.get(i).map(|s| s as &dyn PreyPool),
            PreyId::Resource(i) => self.resources.get(i).map(|r| r as &dyn PreyPool),
        }
        .ok_or(BioenError::UnknownPrey { prey: id })
    }

    pub fn prey_mut(&mut self, id: PreyId) -> BioenResult<&mut dyn PreyPool> {
        match id {
            PreyId::School(i) => self.schools.get_mut(i).map(|s| s as &mut dyn PreyPool),
            PreyId::Resource(i) => self.resources.get_mut(i).map(|r| r as &mut dyn PreyPool),
        }
        .ok_or(BioenError::UnknownPrey { prey: id })
    }

    /// Total instantaneous biomass of the schools of one species.
    pub fn species_biomass(&self, species: usize) -> f64 {
        self.schools
            .iter()
            .filter(|s| s.species() == species)
            .map(|s| s.instantaneous_biomass())
            .sum()
    }

    /// Drop the schools with no individuals left. Returns how many were
    /// removed. School indices change after this call.
    pub fn remove_dead(&mut self) -> usize {
        let before = self.schools.len();
        self.schools.retain(|s| s.is_alive());
        let removed = before - self.schools.len();
        if removed > 0 {
            debug!("removed {} empty schools", removed);
        }
        removed
    }
}
