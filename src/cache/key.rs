//! Cache key generation.
//!
//! Keys are structured, not hashed: invalidation matches on the VIN segment,
//! so it must survive as a field rather than disappear into a digest.

use std::collections::BTreeMap;
use std::fmt;

pub(crate) const OP_VEHICLES: &str = "vehicles";
const OP_STATE: &str = "state";
const OP_BATTERY: &str = "battery";
const OP_STATES: &str = "states";
const OP_DRIVES: &str = "drives";
const OP_PATH: &str = "path";

/// Identifier for one logical request's cached slot.
///
/// Two semantically identical requests always produce equal keys: parameters
/// are canonicalized by sorting on name before serialization, so insertion
/// order cannot leak into the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    op: &'static str,
    vin: Option<String>,
    params: String,
}

impl CacheKey {
    fn new(op: &'static str, vin: Option<&str>, params: &[(&str, String)]) -> Self {
        let canonical: BTreeMap<&str, &str> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let params = canonical
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self {
            op,
            vin: vin.map(str::to_string),
            params,
        }
    }

    /// Roster of all vehicles on the account.
    pub fn vehicles() -> Self {
        Self::new(OP_VEHICLES, None, &[])
    }

    pub fn state(vin: &str) -> Self {
        Self::new(OP_STATE, Some(vin), &[])
    }

    pub fn battery(vin: &str) -> Self {
        Self::new(OP_BATTERY, Some(vin), &[])
    }

    pub fn states(vin: &str, params: &[(&str, String)]) -> Self {
        Self::new(OP_STATES, Some(vin), params)
    }

    pub fn drives(vin: &str, params: &[(&str, String)]) -> Self {
        Self::new(OP_DRIVES, Some(vin), params)
    }

    pub fn path(vin: &str, params: &[(&str, String)]) -> Self {
        Self::new(OP_PATH, Some(vin), params)
    }

    pub fn op(&self) -> &str {
        self.op
    }

    pub fn vin(&self) -> Option<&str> {
        self.vin.as_deref()
    }

    pub(crate) fn is_roster(&self) -> bool {
        self.op == OP_VEHICLES
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.op,
            self.vin.as_deref().unwrap_or("-"),
            self.params
        )
    }
}
