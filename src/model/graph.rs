use std::collections::HashMap;

use crate::model::{
    models::{Consumption, Measure, Method, Release, Software},
    relations::{Association, Handle, Ownership, Pairing},
};

/**
 * In-memory unit of work over the five entity types.
 *
 * Entities are attached once and addressed by `Handle` afterwards. Associations are kept in
 * relation objects so that mutating one side of a relationship always updates the other:
 * owned members hold exclusive back-references, methods pair symmetrically and the
 * release/method association is changed through its add/remove entry points.
 *
 * Foreign key fields of attached entities describe the state they were loaded with;
 * `resolve_loaded_links` turns them into graph links and `method_pair_updates` reports which
 * loaded pair columns no longer match the graph.
 */
#[derive(Default)]
pub struct EntityGraph {
    consumptions: Vec<Consumption>,
    measures: Vec<Measure>,
    methods: Vec<Method>,
    releases: Vec<Release>,
    software: Vec<Software>,
    consumption_measures: Ownership<Consumption, Measure>,
    consumption_methods: Ownership<Consumption, Method>,
    release_software: Ownership<Release, Software>,
    method_pairs: Pairing<Method>,
    release_methods: Association<Release, Method>,
}

impl EntityGraph {
    pub fn new() -> Self {
        EntityGraph::default()
    }

    /* attach & access */

    pub fn attach_consumption(&mut self, consumption: Consumption) -> Handle<Consumption> {
        self.consumptions.push(consumption);
        Handle::new(self.consumptions.len() - 1)
    }

    pub fn attach_measure(&mut self, measure: Measure) -> Handle<Measure> {
        self.measures.push(measure);
        Handle::new(self.measures.len() - 1)
    }

    pub fn attach_method(&mut self, method: Method) -> Handle<Method> {
        self.methods.push(method);
        Handle::new(self.methods.len() - 1)
    }

    pub fn attach_release(&mut self, release: Release) -> Handle<Release> {
        self.releases.push(release);
        Handle::new(self.releases.len() - 1)
    }

    pub fn attach_software(&mut self, software: Software) -> Handle<Software> {
        self.software.push(software);
        Handle::new(self.software.len() - 1)
    }

    pub fn consumption(&self, handle: Handle<Consumption>) -> &Consumption {
        &self.consumptions[handle.index()]
    }

    pub fn measure(&self, handle: Handle<Measure>) -> &Measure {
        &self.measures[handle.index()]
    }

    pub fn method(&self, handle: Handle<Method>) -> &Method {
        &self.methods[handle.index()]
    }

    pub fn release(&self, handle: Handle<Release>) -> &Release {
        &self.releases[handle.index()]
    }

    pub fn software(&self, handle: Handle<Software>) -> &Software {
        &self.software[handle.index()]
    }

    /**
     * Finds an attached method by its persisted id.
     */
    pub fn find_method(&self, id: i64) -> Option<Handle<Method>> {
        self.methods.iter().position(|method| method.id == Some(id)).map(Handle::new)
    }

    /* Consumption <-> Measure */

    pub fn measures_of(&self, consumption: Handle<Consumption>) -> Vec<Handle<Measure>> {
        self.consumption_measures.members(consumption)
    }

    pub fn consumption_of_measure(&self, measure: Handle<Measure>) -> Option<Handle<Consumption>> {
        self.consumption_measures.owner(measure)
    }

    pub fn set_measures(&mut self, consumption: Handle<Consumption>, measures: impl IntoIterator<Item = Handle<Measure>>) {
        self.consumption_measures.set_members(consumption, measures);
    }

    pub fn add_measure(&mut self, consumption: Handle<Consumption>, measure: Handle<Measure>) {
        self.consumption_measures.add_member(consumption, measure);
    }

    pub fn remove_measure(&mut self, consumption: Handle<Consumption>, measure: Handle<Measure>) {
        self.consumption_measures.remove_member(consumption, measure);
    }

    pub fn set_measure_consumption(&mut self, measure: Handle<Measure>, consumption: Option<Handle<Consumption>>) {
        self.consumption_measures.set_owner(measure, consumption);
    }

    /* Consumption <-> Method */

    pub fn methods_of(&self, consumption: Handle<Consumption>) -> Vec<Handle<Method>> {
        self.consumption_methods.members(consumption)
    }

    pub fn consumption_of_method(&self, method: Handle<Method>) -> Option<Handle<Consumption>> {
        self.consumption_methods.owner(method)
    }

    pub fn set_methods(&mut self, consumption: Handle<Consumption>, methods: impl IntoIterator<Item = Handle<Method>>) {
        self.consumption_methods.set_members(consumption, methods);
    }

    pub fn add_method(&mut self, consumption: Handle<Consumption>, method: Handle<Method>) {
        self.consumption_methods.add_member(consumption, method);
    }

    pub fn remove_method(&mut self, consumption: Handle<Consumption>, method: Handle<Method>) {
        self.consumption_methods.remove_member(consumption, method);
    }

    pub fn set_method_consumption(&mut self, method: Handle<Method>, consumption: Option<Handle<Consumption>>) {
        self.consumption_methods.set_owner(method, consumption);
    }

    /* Release <-> Software */

    pub fn software_of(&self, release: Handle<Release>) -> Vec<Handle<Software>> {
        self.release_software.members(release)
    }

    pub fn release_of_software(&self, software: Handle<Software>) -> Option<Handle<Release>> {
        self.release_software.owner(software)
    }

    pub fn set_software(&mut self, release: Handle<Release>, software: impl IntoIterator<Item = Handle<Software>>) {
        self.release_software.set_members(release, software);
    }

    pub fn add_software(&mut self, release: Handle<Release>, software: Handle<Software>) {
        self.release_software.add_member(release, software);
    }

    pub fn remove_software(&mut self, release: Handle<Release>, software: Handle<Software>) {
        self.release_software.remove_member(release, software);
    }

    pub fn set_software_release(&mut self, software: Handle<Software>, release: Option<Handle<Release>>) {
        self.release_software.set_owner(software, release);
    }

    /* Method <-> Method */

    pub fn paired_method(&self, method: Handle<Method>) -> Option<Handle<Method>> {
        self.method_pairs.partner(method)
    }

    pub fn set_paired_method(&mut self, method: Handle<Method>, other: Option<Handle<Method>>) {
        self.method_pairs.set_pair(method, other);
    }

    /* Release <-> Method */

    pub fn release_methods(&self, release: Handle<Release>) -> Vec<Handle<Method>> {
        self.release_methods.right_of(release)
    }

    pub fn method_releases(&self, method: Handle<Method>) -> Vec<Handle<Release>> {
        self.release_methods.left_of(method)
    }

    pub fn add_release_method(&mut self, release: Handle<Release>, method: Handle<Method>) {
        self.release_methods.add(release, method);
    }

    pub fn remove_release_method(&mut self, release: Handle<Release>, method: Handle<Method>) {
        self.release_methods.remove(release, method);
    }

    /**
     * Replaces the method collection of `release`. The releases of the methods are not rewritten.
     */
    pub fn set_release_methods(&mut self, release: Handle<Release>, methods: impl IntoIterator<Item = Handle<Method>>) {
        self.release_methods.set_left_collection(release, methods);
    }

    /**
     * Replaces the releases of `method`, updating the method collection of every release involved.
     */
    pub fn set_method_releases(&mut self, method: Handle<Method>, releases: impl IntoIterator<Item = Handle<Release>>) {
        self.release_methods.set_right_of(method, releases);
    }

    /* loaded state */

    /**
     * Links attached entities according to the foreign keys they were loaded with. References to
     * entities that are not attached are ignored.
     */
    pub fn resolve_loaded_links(&mut self) {
        let consumption_ids = Self::index_by_id(self.consumptions.iter().map(|consumption| consumption.id));
        let method_ids = Self::index_by_id(self.methods.iter().map(|method| method.id));
        let release_ids = Self::index_by_id(self.releases.iter().map(|release| release.id));

        for (index, measure) in self.measures.iter().enumerate() {
            if let Some(owner) = measure.consumption_id.and_then(|id| consumption_ids.get(&id)) {
                self.consumption_measures.add_member(Handle::new(*owner), Handle::new(index));
            }
        }
        for (index, method) in self.methods.iter().enumerate() {
            if let Some(owner) = method.consumption_id.and_then(|id| consumption_ids.get(&id)) {
                self.consumption_methods.add_member(Handle::new(*owner), Handle::new(index));
            }
            if let Some(partner) = method.method_id.and_then(|id| method_ids.get(&id)) {
                self.method_pairs.set_pair(Handle::new(index), Some(Handle::new(*partner)));
            }
        }
        for (index, software) in self.software.iter().enumerate() {
            if let Some(owner) = software.release_id.and_then(|id| release_ids.get(&id)) {
                self.release_software.add_member(Handle::new(*owner), Handle::new(index));
            }
        }
        for (index, release) in self.releases.iter().enumerate() {
            for method in release.method_ids.iter().flatten() {
                if let Some(method) = method_ids.get(method) {
                    self.release_methods.add(Handle::new(index), Handle::new(*method));
                }
            }
        }
    }

    /**
     * Persisted methods whose loaded pair column differs from the graph, with the value the column
     * must hold. Columns referencing methods that are not attached are not reported.
     */
    pub fn method_pair_updates(&self) -> Vec<(i64, Option<i64>)> {
        self.methods
            .iter()
            .enumerate()
            .filter_map(|(index, method)| {
                let id = method.id?;
                let current = self.method_pairs.partner(Handle::new(index)).and_then(|partner| self.methods[partner.index()].id);
                let unresolved = current.is_none() && method.method_id.is_some_and(|partner| !self.methods.iter().any(|method| method.id == Some(partner)));
                (current != method.method_id && !unresolved).then_some((id, current))
            })
            .collect()
    }

    fn index_by_id(ids: impl Iterator<Item = Option<i64>>) -> HashMap<i64, usize> {
        ids.enumerate().filter_map(|(index, id)| id.map(|id| (id, index))).collect()
    }
}
