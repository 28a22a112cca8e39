//! In-process template store.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::store::TemplateStore;
use crate::template::{validate_duration, AdTemplate, IdClock, TemplateDraft, TemplateId};
use crate::trace::trace_event;
use crate::util::{AdSkipError, AdSkipResult};

/// Template store backed by ordered maps; records and host index are updated
/// together under `&mut self`.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    records: BTreeMap<TemplateId, AdTemplate>,
    by_host: HashMap<String, BTreeSet<TemplateId>>,
    clock: IdClock,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored templates.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn unindex(&mut self, id: TemplateId, host: &str) {
        if let Some(ids) = self.by_host.get_mut(host) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_host.remove(host);
            }
        }
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn put(&mut self, template: AdTemplate) -> AdSkipResult<TemplateId> {
        template.validate()?;
        let id = template.id;
        self.clock.observe(id);
        self.by_host
            .entry(template.host.clone())
            .or_default()
            .insert(id);
        if let Some(previous) = self.records.insert(id, template) {
            if self.records[&id].host != previous.host {
                self.unindex(id, &previous.host);
            }
        }
        trace_event!(debug, "template_stored", id = id.0);
        Ok(id)
    }

    fn insert(&mut self, draft: TemplateDraft) -> AdSkipResult<AdTemplate> {
        let template = draft.into_template(self.clock.next_id())?;
        self.put(template.clone())?;
        Ok(template)
    }

    fn get(&self, id: TemplateId) -> AdSkipResult<Option<AdTemplate>> {
        Ok(self.records.get(&id).cloned())
    }

    fn query_by_host(&self, host: &str) -> AdSkipResult<Vec<AdTemplate>> {
        let Some(ids) = self.by_host.get(host) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect())
    }

    fn update_duration(&mut self, id: TemplateId, duration_ms: i64) -> AdSkipResult<()> {
        let duration_ms = validate_duration(duration_ms)?;
        let record = self
            .records
            .get_mut(&id)
            .ok_or(AdSkipError::NotFound(id))?;
        record.duration_ms = duration_ms;
        trace_event!(debug, "duration_updated", id = id.0, duration_ms = duration_ms);
        Ok(())
    }

    fn delete_by_host(&mut self, host: &str) -> AdSkipResult<usize> {
        let Some(ids) = self.by_host.remove(host) else {
            return Ok(0);
        };
        for id in &ids {
            self.records.remove(id);
        }
        trace_event!(debug, "host_cleaned", count = ids.len());
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryTemplateStore;
    use crate::image::GrayImage;
    use crate::store::TemplateStore;
    use crate::template::{TemplateDraft, TemplateId};

    fn draft(host: &str) -> TemplateDraft {
        TemplateDraft::new(host, GrayImage::filled(3, 3, 7).unwrap(), None, 3700).unwrap()
    }

    #[test]
    fn overwrite_moves_host_index() {
        let mut store = MemoryTemplateStore::new();
        let mut template = store.insert(draft("a.test")).unwrap();
        template.host = "b.test".into();
        store.put(template.clone()).unwrap();

        assert!(store.query_by_host("a.test").unwrap().is_empty());
        assert_eq!(store.query_by_host("b.test").unwrap(), vec![template]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_keeps_later_ids_unique() {
        let mut store = MemoryTemplateStore::new();
        let mut template = store.insert(draft("a.test")).unwrap();
        template.id = TemplateId(i64::MAX / 2);
        store.put(template).unwrap();
        let next = store.insert(draft("a.test")).unwrap();
        assert!(next.id > TemplateId(i64::MAX / 2));
    }
}
