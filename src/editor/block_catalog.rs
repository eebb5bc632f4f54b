//! Function-block catalog organised by category.
//!
//! The catalog maps a block type name to its port counts and default
//! parameters. The editor consults it exactly once per node, at creation;
//! the resolved counts are stored on the node.
//!
//! # Usage
//!
//! ```rust
//! use wirelink::editor::block_catalog::{BlockCatalog, get_block_catalog};
//!
//! let catalog = get_block_catalog();
//! let and = catalog.lookup("AND").unwrap();
//! assert_eq!((and.default_inputs, and.default_outputs), (2, 1));
//! let timers: Vec<_> = catalog.iter().filter(|e| e.matches_query("timer")).collect();
//! assert!(!timers.is_empty());
//! ```

use anyhow::{Context, Result};
use camino::Utf8Path;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::model::ParamValue;

/// A single entry in the block catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCatalogEntry {
    /// Block type name (e.g., `"AND"`, `"TON"`).
    pub block_type: String,
    /// Human-readable name shown in the palette.
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub category: String,
    pub default_inputs: u32,
    pub default_outputs: u32,
    /// Parameters copied onto every new node of this type.
    #[serde(default)]
    pub default_parameters: IndexMap<String, ParamValue>,
    #[serde(default)]
    pub description: String,
}

impl BlockCatalogEntry {
    /// Case-insensitive substring match on type, display name, category or
    /// description. An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let q = query.to_lowercase();
        self.block_type.to_lowercase().contains(&q)
            || self.display_name.to_lowercase().contains(&q)
            || self.category.to_lowercase().contains(&q)
            || self.description.to_lowercase().contains(&q)
    }

    fn with_param(mut self, key: &str, value: ParamValue) -> Self {
        self.default_parameters.insert(key.to_string(), value);
        self
    }
}

/// A category of blocks in the catalog.
#[derive(Debug, Clone)]
pub struct BlockCatalogCategory {
    pub name: String,
    pub entries: Vec<BlockCatalogEntry>,
}

/// Read-only lookup from block type name to template.
pub trait BlockCatalog {
    fn lookup(&self, block_type: &str) -> Option<&BlockCatalogEntry>;
}

impl BlockCatalog for [BlockCatalogEntry] {
    fn lookup(&self, block_type: &str) -> Option<&BlockCatalogEntry> {
        self.iter().find(|e| e.block_type == block_type)
    }
}

impl BlockCatalog for Vec<BlockCatalogEntry> {
    fn lookup(&self, block_type: &str) -> Option<&BlockCatalogEntry> {
        self.as_slice().lookup(block_type)
    }
}

/// The built-in catalog returned by [`get_block_catalog`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl BlockCatalog for BuiltinCatalog {
    fn lookup(&self, block_type: &str) -> Option<&BlockCatalogEntry> {
        get_block_catalog().lookup(block_type)
    }
}

/// Load a custom catalog from a JSON array of entries.
pub fn load_catalog(path: &Utf8Path) -> Result<Vec<BlockCatalogEntry>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Read catalog {}", path))?;
    let entries: Vec<BlockCatalogEntry> =
        serde_json::from_str(&text).with_context(|| format!("Parse catalog {}", path))?;
    log::debug!("loaded {} catalog entries from {}", entries.len(), path);
    Ok(entries)
}

fn entry(
    block_type: &str,
    display_name: &str,
    category: &str,
    inputs: u32,
    outputs: u32,
    description: &str,
) -> BlockCatalogEntry {
    BlockCatalogEntry {
        block_type: block_type.to_string(),
        display_name: display_name.to_string(),
        category: category.to_string(),
        default_inputs: inputs,
        default_outputs: outputs,
        default_parameters: IndexMap::new(),
        description: description.to_string(),
    }
}

/// Returns the built-in catalog, initialised on first access.
pub fn get_block_catalog() -> &'static [BlockCatalogEntry] {
    static CATALOG: Lazy<Vec<BlockCatalogEntry>> = Lazy::new(build_catalog);
    &CATALOG
}

/// Returns the built-in catalog grouped by category, in catalog order.
pub fn get_block_catalog_by_category() -> &'static [BlockCatalogCategory] {
    static CATEGORIES: Lazy<Vec<BlockCatalogCategory>> =
        Lazy::new(|| group_by_category(get_block_catalog()));
    &CATEGORIES
}

pub fn group_by_category(catalog: &[BlockCatalogEntry]) -> Vec<BlockCatalogCategory> {
    let mut cat_map: IndexMap<String, Vec<BlockCatalogEntry>> = IndexMap::new();
    for e in catalog {
        cat_map.entry(e.category.clone()).or_default().push(e.clone());
    }
    cat_map
        .into_iter()
        .map(|(name, entries)| BlockCatalogCategory { name, entries })
        .collect()
}

fn build_catalog() -> Vec<BlockCatalogEntry> {
    use ParamValue::{Bool, Float, Int, Text};

    let mut c = Vec::with_capacity(48);

    // ── Bit logic ────────────────────────────────────────────────────────
    let cat = "Bit logic";
    c.push(entry("AND", "AND", cat, 2, 1, "Logical AND of all inputs"));
    c.push(entry("OR", "OR", cat, 2, 1, "Logical OR of all inputs"));
    c.push(entry("XOR", "XOR", cat, 2, 1, "Exclusive OR"));
    c.push(entry("NOT", "NOT", cat, 1, 1, "Logical negation"));
    c.push(entry("NAND", "NAND", cat, 2, 1, "Negated AND"));
    c.push(entry("NOR", "NOR", cat, 2, 1, "Negated OR"));
    c.push(entry("SR", "Set/Reset", cat, 2, 1, "Set-dominant bistable"));
    c.push(entry("RS", "Reset/Set", cat, 2, 1, "Reset-dominant bistable"));
    c.push(entry("R_TRIG", "Rising edge", cat, 1, 1, "Pulse on rising edge"));
    c.push(entry("F_TRIG", "Falling edge", cat, 1, 1, "Pulse on falling edge"));

    // ── Timers ───────────────────────────────────────────────────────────
    let cat = "Timers";
    c.push(entry("TON", "On-delay timer", cat, 1, 2, "Output goes high after PT elapses").with_param("PT", Int(1000)));
    c.push(entry("TOF", "Off-delay timer", cat, 1, 2, "Output stays high for PT after input falls").with_param("PT", Int(1000)));
    c.push(entry("TP", "Pulse timer", cat, 1, 2, "Fixed-length pulse of PT").with_param("PT", Int(500)));

    // ── Counters ─────────────────────────────────────────────────────────
    let cat = "Counters";
    c.push(entry("CTU", "Up counter", cat, 2, 2, "Count up, reset on R").with_param("PV", Int(10)));
    c.push(entry("CTD", "Down counter", cat, 2, 2, "Count down, load on LD").with_param("PV", Int(10)));
    c.push(entry("CTUD", "Up/down counter", cat, 4, 3, "Bidirectional counter").with_param("PV", Int(10)));

    // ── Comparison ───────────────────────────────────────────────────────
    let cat = "Comparison";
    c.push(entry("GT", "Greater than", cat, 2, 1, "IN1 > IN2"));
    c.push(entry("GE", "Greater or equal", cat, 2, 1, "IN1 >= IN2"));
    c.push(entry("EQ", "Equal", cat, 2, 1, "IN1 = IN2"));
    c.push(entry("NE", "Not equal", cat, 2, 1, "IN1 <> IN2"));
    c.push(entry("LE", "Less or equal", cat, 2, 1, "IN1 <= IN2"));
    c.push(entry("LT", "Less than", cat, 2, 1, "IN1 < IN2"));

    // ── Arithmetic ───────────────────────────────────────────────────────
    let cat = "Arithmetic";
    c.push(entry("ADD", "Add", cat, 2, 1, "Sum of inputs"));
    c.push(entry("SUB", "Subtract", cat, 2, 1, "IN1 - IN2"));
    c.push(entry("MUL", "Multiply", cat, 2, 1, "Product of inputs"));
    c.push(entry("DIV", "Divide", cat, 2, 1, "IN1 / IN2"));
    c.push(entry("MOD", "Modulo", cat, 2, 1, "Remainder of IN1 / IN2"));
    c.push(entry("ABS", "Absolute value", cat, 1, 1, "|IN|"));
    c.push(entry("SCALE", "Scale", cat, 1, 1, "Linear scaling k*IN + d").with_param("k", Float(1.0)).with_param("d", Float(0.0)));

    // ── Selection ────────────────────────────────────────────────────────
    let cat = "Selection";
    c.push(entry("SEL", "Select", cat, 3, 1, "G ? IN1 : IN0"));
    c.push(entry("MUX", "Multiplexer", cat, 3, 1, "Select input by index K"));
    c.push(entry("MAX", "Maximum", cat, 2, 1, "Largest input"));
    c.push(entry("MIN", "Minimum", cat, 2, 1, "Smallest input"));
    c.push(entry("LIMIT", "Limit", cat, 3, 1, "Clamp IN between MN and MX"));
    c.push(entry("MOVE", "Move", cat, 1, 1, "Copy input to output"));

    // ── I/O ──────────────────────────────────────────────────────────────
    let cat = "I/O";
    c.push(entry("INPUT", "Digital input", cat, 0, 1, "Read a process input").with_param("address", Text(String::new())));
    c.push(entry("OUTPUT", "Digital output", cat, 1, 0, "Write a process output").with_param("address", Text(String::new())));
    c.push(entry("AI", "Analog input", cat, 0, 1, "Read an analog channel").with_param("address", Text(String::new())));
    c.push(entry("AO", "Analog output", cat, 1, 0, "Write an analog channel").with_param("address", Text(String::new())));
    c.push(entry("CONST", "Constant", cat, 0, 1, "Constant value").with_param("value", Float(0.0)));
    c.push(entry("BOOL_CONST", "Boolean constant", cat, 0, 1, "Constant TRUE/FALSE").with_param("value", Bool(false)));

    c
}
