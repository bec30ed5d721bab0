use std::collections::HashMap;

/// Default number of templates kept for the whole run.
pub const DEFAULT_CAPACITY: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub typ: u16,
    pub length: u16,
}

/// Template is what survives of a template record once all its fields are
/// parsed, only the byte length of the Flow Records built from it is needed
/// to walk data flow sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Template {
    /// Template ids of data flow sets are numbered from 256 to 65535.
    pub id: u16,

    /// Sum of the field lengths declared by the template record.
    pub record_length: u16,
}

impl Template {
    pub fn from_fields(id: u16, fields: &[Field]) -> Self {
        let record_length = fields
            .iter()
            .fold(0u16, |acc, field| acc.saturating_add(field.length));

        Template { id, record_length }
    }
}

pub trait TemplateSystem {
    fn get(&self, template_id: u16) -> Option<&Template>;

    /// Stores the template if the id is unseen and there is room for it,
    /// returns whether it was stored. A stored template is never replaced.
    fn add(&mut self, template: Template) -> bool;
}

/// A bounded, grow-only template store. Once full, new templates are
/// silently dropped and data flow sets referencing them fall back to
/// approximated record counts.
#[derive(Debug)]
pub struct TemplateCache {
    capacity: usize,
    inner: HashMap<u16, Template>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        TemplateCache::with_capacity(DEFAULT_CAPACITY)
    }
}

impl TemplateCache {
    pub fn with_capacity(capacity: usize) -> Self {
        TemplateCache {
            capacity,
            inner: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.capacity
    }
}

impl TemplateSystem for TemplateCache {
    fn get(&self, template_id: u16) -> Option<&Template> {
        self.inner.get(&template_id)
    }

    fn add(&mut self, template: Template) -> bool {
        if self.is_full() || self.inner.contains_key(&template.id) {
            return false;
        }

        self.inner.insert(template.id, template);
        true
    }
}
