//! Data section

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DataItem {
    Float { label: String, value: f32 },
}

impl DataItem {
    pub fn label(&self) -> &str {
        match self {
            DataItem::Float { label, .. } => label,
        }
    }
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataItem::Float { label, value } => write!(f, "{}: .float {:?}", label, value),
        }
    }
}

/// Float constants referenced by the text section, one label per distinct
/// bit pattern
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSection {
    items: Vec<DataItem>,
}

impl DataSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label holding `value`, adding it on first use
    pub fn intern_float(&mut self, value: f32) -> String {
        let existing = self.items.iter().find_map(|item| match item {
            DataItem::Float { label, value: v } if v.to_bits() == value.to_bits() => Some(label.clone()),
            _ => None,
        });
        if let Some(label) = existing {
            return label;
        }
        let label = format!("flt_{}", self.items.len());
        self.items.push(DataItem::Float {
            label: label.clone(),
            value,
        });
        label
    }

    pub fn items(&self) -> &[DataItem] {
        &self.items
    }

    pub fn float_value(&self, label: &str) -> Option<f32> {
        self.items.iter().find_map(|item| match item {
            DataItem::Float { label: l, value } if l == label => Some(*value),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
