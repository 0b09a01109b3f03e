use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub label: String,
    pub amount: f64,
}

impl CostItem {
    pub fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// A cost field that is either entered directly or broken down into line items.
#[derive(Debug, Clone, PartialEq)]
pub enum CostSource {
    Scalar(f64),
    Itemized(Vec<CostItem>),
}

impl CostSource {
    /// An empty item list leaves the scalar authoritative.
    pub fn new(scalar: f64, items: Vec<CostItem>) -> Self {
        if items.is_empty() {
            Self::Scalar(scalar)
        } else {
            Self::Itemized(items)
        }
    }

    pub fn effective_value(&self) -> f64 {
        match self {
            Self::Scalar(amount) => *amount,
            Self::Itemized(items) => items.iter().map(|item| item.amount).sum(),
        }
    }

    pub fn items(&self) -> &[CostItem] {
        match self {
            Self::Scalar(_) => &[],
            Self::Itemized(items) => items,
        }
    }
}
