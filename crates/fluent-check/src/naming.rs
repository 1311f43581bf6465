//! Entity Naming
//!
//! Maps a type to the role name used in messages ("the checked string",
//! "the expected enumerable"). Names are memoized per type: message
//! construction runs on every failing check, and a lost race only computes
//! the same label twice.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::inspect::{Category, Inspect, TypeInfo};

/// Name used when nothing more specific is known
pub const DEFAULT_ENTITY: &str = "value";

type Memo = RwLock<HashMap<(&'static str, Category), &'static str>>;

fn memo() -> &'static Memo {
    static MEMO: OnceLock<Memo> = OnceLock::new();
    MEMO.get_or_init(|| RwLock::new(HashMap::new()))
}

const fn label_for(category: Category) -> &'static str {
    match category {
        Category::Boolean => "boolean",
        Category::String => "string",
        Category::DateTime => "date time",
        Category::Duration => "duration",
        Category::Char => "char",
        Category::Enum => "enum",
        Category::Nullable => "nullable",
        Category::Event => "event",
        Category::Dictionary => "dictionary",
        Category::Enumerable => "enumerable",
        Category::Struct => "struct",
        Category::Numeric | Category::Object => DEFAULT_ENTITY,
    }
}

/// Role name of a type
#[must_use]
pub fn name_for(info: &TypeInfo) -> &'static str {
    let key = (info.token(), info.category());
    if let Some(name) = memo()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return name;
    }
    let name = label_for(info.category());
    memo()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, name);
    name
}

/// Role name of `T`, without a value at hand
#[must_use]
pub fn name_for_type<T: Inspect + ?Sized>() -> &'static str {
    name_for(&TypeInfo::of::<T>(T::category()))
}

/// Resolves the label of one side of a message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityNaming {
    entity_type: Option<TypeInfo>,
    name_override: Option<String>,
    plural: bool,
}

impl EntityNaming {
    /// Naming with no information, resolving to "value"
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Naming derived from a type
    #[must_use]
    pub fn for_type(info: TypeInfo) -> Self {
        Self {
            entity_type: Some(info),
            ..Self::default()
        }
    }

    /// Set the type the name derives from
    pub fn set_type(&mut self, info: TypeInfo) {
        self.entity_type = Some(info);
    }

    /// Set an explicit name; always wins over the type
    pub fn set_override(&mut self, name: impl Into<String>) {
        self.name_override = Some(name.into());
    }

    /// Mark the entity as possibly plural ("value(s)")
    pub fn set_plural(&mut self, plural: bool) {
        self.plural = plural;
    }

    /// Type the name derives from
    #[must_use]
    pub const fn entity_type(&self) -> Option<&TypeInfo> {
        self.entity_type.as_ref()
    }

    /// Whether an explicit name was supplied
    #[must_use]
    pub const fn has_override(&self) -> bool {
        self.name_override.is_some()
    }

    /// Take every piece of information `other` supplies
    pub fn merge(&mut self, other: &Self) {
        if let Some(info) = &other.entity_type {
            self.entity_type = Some(info.clone());
        }
        if let Some(name) = &other.name_override {
            self.name_override = Some(name.clone());
        }
        self.plural |= other.plural;
    }

    /// Resolved label
    #[must_use]
    pub fn label(&self) -> String {
        let base = match (&self.name_override, &self.entity_type) {
            (Some(name), _) => name.clone(),
            (None, Some(info)) => name_for(info).to_string(),
            (None, None) => DEFAULT_ENTITY.to_string(),
        };
        if self.plural {
            format!("{base}(s)")
        } else {
            base
        }
    }
}
