use super::{FindParams, FindResult, Probe, summarize_all};
use crate::entity_resolver::{EntityQuery, EntityResolver};
use crate::error::Result;
use crate::host::Host;

impl Probe {
    /// Locate entities; no match is an empty result, not an error
    pub fn find(&mut self, host: &Host<'_>, params: &FindParams) -> Result<FindResult> {
        let found = EntityResolver::new(&*host.store, host.catalog, &mut self.types)
            .find(&EntityQuery::from(&params.target))?;
        let entities = summarize_all(&*host.store, &found)?;
        Ok(FindResult {
            count: entities.len(),
            entities,
        })
    }
}
