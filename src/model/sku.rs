// src/model/sku.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mattress size. Declaration order is the canonical iteration order used
/// everywhere a deterministic walk over sizes is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    King,
    Queen,
    Double,
    KingSingle,
    Single,
}

impl Size {
    pub const ALL: [Size; 5] = [
        Size::King,
        Size::Queen,
        Size::Double,
        Size::KingSingle,
        Size::Single,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::King => "King",
            Size::Queen => "Queen",
            Size::Double => "Double",
            Size::KingSingle => "King Single",
            Size::Single => "Single",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spring firmness. Pure pallets are emitted in this declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Firmness {
    Firm,
    Medium,
    Soft,
}

impl Firmness {
    pub const ALL: [Firmness; 3] = [Firmness::Firm, Firmness::Medium, Firmness::Soft];

    pub fn as_str(&self) -> &'static str {
        match self {
            Firmness::Firm => "Firm",
            Firmness::Medium => "Medium",
            Firmness::Soft => "Soft",
        }
    }
}

impl fmt::Display for Firmness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downstream parts that are consumed one-for-one (times a multiplier)
/// with each spring unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentId {
    MicroCoils,
    ThinLatex,
    Felt,
    TopPanel,
    BottomPanel,
    SidePanel,
}

impl ComponentId {
    pub const ALL: [ComponentId; 6] = [
        ComponentId::MicroCoils,
        ComponentId::ThinLatex,
        ComponentId::Felt,
        ComponentId::TopPanel,
        ComponentId::BottomPanel,
        ComponentId::SidePanel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentId::MicroCoils => "Micro Coils",
            ComponentId::ThinLatex => "Thin Latex",
            ComponentId::Felt => "Felt",
            ComponentId::TopPanel => "Top Panel",
            ComponentId::BottomPanel => "Bottom Panel",
            ComponentId::SidePanel => "Side Panel",
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (size, firmness) pair tracked as an independent inventory unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sku {
    pub size: Size,
    pub firmness: Firmness,
}

impl Sku {
    pub fn new(size: Size, firmness: Firmness) -> Self {
        Self { size, firmness }
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.size, self.firmness)
    }
}
