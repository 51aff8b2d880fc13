use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::*;
use crate::listing::Page;
use crate::reference::{Labeled, Reference};

/// A product as supplied by a create or update request.
///
/// `Option` attributes are presence flags: `None` leaves the stored column
/// untouched on update and omits it on insert. They never mean SQL `NULL`.
///
/// Canonical names and synonyms share one uniquely labelled table, so a
/// `New` synonym equal to the `New` name (after upper-casing) fails the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductWrite {
    #[serde(default)]
    pub specificity: Option<String>,
    #[serde(default)]
    pub msds: Option<String>,
    #[serde(default)]
    pub restricted: Option<bool>,
    #[serde(default)]
    pub radioactive: Option<bool>,
    #[serde(default)]
    pub linear_formula: Option<String>,
    #[serde(default)]
    pub three_d_formula: Option<String>,
    #[serde(default)]
    pub disposal_comment: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,

    pub cas_number: Reference<CasNumberId>,
    #[serde(default)]
    pub ce_number: Option<Reference<CeNumberId>>,
    pub name: Reference<NameId>,
    pub empirical_formula: Reference<EmpiricalFormulaId>,
    #[serde(default)]
    pub class_of_compound: Option<Reference<ClassOfCompoundId>>,
    #[serde(default)]
    pub physical_state: Option<PhysicalStateId>,
    #[serde(default)]
    pub signal_word: Option<SignalWordId>,
    pub person: PersonId,

    #[serde(default)]
    pub synonyms: Vec<Reference<NameId>>,
    #[serde(default)]
    pub symbols: BTreeSet<SymbolId>,
    #[serde(default)]
    pub hazard_statements: BTreeSet<HazardStatementId>,
    #[serde(default)]
    pub precautionary_statements: BTreeSet<PrecautionaryStatementId>,
}

impl ProductWrite {
    pub fn new(
        name: Reference<NameId>,
        cas_number: Reference<CasNumberId>,
        empirical_formula: Reference<EmpiricalFormulaId>,
        person: PersonId,
    ) -> Self {
        Self {
            specificity: None,
            msds: None,
            restricted: None,
            radioactive: None,
            linear_formula: None,
            three_d_formula: None,
            disposal_comment: None,
            remark: None,
            cas_number,
            ce_number: None,
            name,
            empirical_formula,
            class_of_compound: None,
            physical_state: None,
            signal_word: None,
            person,
            synonyms: Vec::new(),
            symbols: BTreeSet::new(),
            hazard_statements: BTreeSet::new(),
            precautionary_statements: BTreeSet::new(),
        }
    }
}

/// A hazard or precautionary statement, e.g. `H225` / "Highly flammable liquid and vapour".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement<I> {
    pub id: I,
    pub label: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub specificity: Option<String>,
    pub msds: Option<String>,
    pub restricted: bool,
    pub radioactive: bool,
    pub linear_formula: Option<String>,
    pub three_d_formula: Option<String>,
    pub disposal_comment: Option<String>,
    pub remark: Option<String>,
    pub cas_number: Labeled<CasNumberId>,
    pub ce_number: Option<Labeled<CeNumberId>>,
    pub name: Labeled<NameId>,
    pub empirical_formula: Labeled<EmpiricalFormulaId>,
    pub class_of_compound: Option<Labeled<ClassOfCompoundId>>,
    pub physical_state: Option<Labeled<PhysicalStateId>>,
    pub signal_word: Option<Labeled<SignalWordId>>,
    pub person: PersonId,
    pub symbols: Vec<Labeled<SymbolId>>,
    pub synonyms: Vec<Labeled<NameId>>,
    pub hazard_statements: Vec<Statement<HazardStatementId>>,
    pub precautionary_statements: Vec<Statement<PrecautionaryStatementId>>,
}

impl Product {
    pub fn symbol_ids(&self) -> BTreeSet<SymbolId> {
        self.symbols.iter().map(|s| s.id).collect()
    }

    pub fn synonym_labels(&self) -> BTreeSet<&str> {
        self.synonyms.iter().map(|s| s.label.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    CasNumber,
    EmpiricalFormula,
    Id,
}

/// Narrowing applied by product list queries on top of permission filtering.
///
/// With an entity or store location filter, only stock held in entities the
/// person may read products in counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    /// Matched with SQL `LIKE` against the canonical name; `None` matches all.
    pub search: Option<String>,
    pub product: Option<ProductId>,
    pub entity: Option<EntityId>,
    pub store_location: Option<StoreLocationId>,
    pub name: Option<NameId>,
    /// Only products bookmarked by the requesting person.
    pub bookmarked: bool,
    pub sort: ProductSort,
    pub page: Page,
}
