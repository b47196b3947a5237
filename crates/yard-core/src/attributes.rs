//! Attribute decoding
//!
//! Reservations carry free-form key/value attribute lists on their storage
//! and GPU requests. This module decodes them into typed selectors:
//!
//! - Storage: `persistent` (bool) and `class` (string), with the reserved
//!   classes `"ram"` (account against node memory) and `"default"` (resolve
//!   to the cluster's default pool).
//! - GPU: selector keys of the form
//!   `vendor/<V>/model/<M>[/ram/<R>][/interface/<I>]`; the value is ignored.
//!   Vendor tokens compare lowercase, the model `"*"` matches any model.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Storage attribute key marking a volume as persistent
pub const STORAGE_ATTRIBUTE_PERSISTENT: &str = "persistent";

/// Storage attribute key naming the storage class
pub const STORAGE_ATTRIBUTE_CLASS: &str = "class";

/// Reserved class accounted against node memory instead of storage
pub const STORAGE_CLASS_RAM: &str = "ram";

/// Reserved class resolved to the cluster's default pool
pub const STORAGE_CLASS_DEFAULT: &str = "default";

/// GPU model selector matching any model name
pub const GPU_MODEL_WILDCARD: &str = "*";

/// A single free-form key/value attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    /// Create a new attribute
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An ordered attribute list
pub type Attributes = Vec<Attribute>;

/// Decoded storage attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAttributes {
    /// Requested storage class; empty for unclassed ephemeral storage
    pub class: String,

    /// Whether the volume outlives the workload and is billed against a
    /// cluster pool rather than the node
    pub persistent: bool,
}

impl StorageAttributes {
    /// Decode storage attributes from an attribute list.
    ///
    /// Unknown keys are ignored. A missing `persistent` defaults to false; a
    /// persistent volume without a class is an error.
    pub fn parse(attrs: &Attributes) -> Result<Self> {
        let mut decoded = StorageAttributes::default();

        for attr in attrs {
            match attr.key.as_str() {
                STORAGE_ATTRIBUTE_PERSISTENT => {
                    decoded.persistent = attr.value.parse::<bool>().map_err(|_| {
                        Error::invalid_attributes(format!(
                            "persistent must be a boolean, got {:?}",
                            attr.value
                        ))
                    })?;
                }
                STORAGE_ATTRIBUTE_CLASS => {
                    decoded.class = attr.value.clone();
                }
                _ => {}
            }
        }

        if decoded.persistent && decoded.class.is_empty() {
            return Err(Error::invalid_attributes(
                "persistent storage requires a class",
            ));
        }

        Ok(decoded)
    }
}

/// Constraints attached to a single GPU vendor/model selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuModelSpec {
    /// Required memory size label (e.g. "24Gi"); `None` matches any
    pub ram: Option<String>,

    /// Required interface label (e.g. "pcie"); `None` matches any
    pub interface: Option<String>,
}

impl GpuModelSpec {
    /// Render the canonical selector key for this spec against a concrete
    /// vendor and model
    pub fn selector_key(&self, vendor: &str, model: &str) -> String {
        let mut key = format!("vendor/{}/model/{}", vendor, model);

        if let Some(ram) = &self.ram {
            key = format!("{}/ram/{}", key, ram);
        }

        if let Some(interface) = &self.interface {
            key = format!("{}/interface/{}", key, interface);
        }

        key
    }
}

/// Model selectors for a single vendor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuModels(BTreeMap<String, GpuModelSpec>);

impl GpuModels {
    /// Look up a model, falling back to the wildcard entry
    pub fn get_or_wildcard(&self, model: &str) -> Option<&GpuModelSpec> {
        self.0.get(model).or_else(|| self.0.get(GPU_MODEL_WILDCARD))
    }

    /// Number of model selectors for this vendor
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this vendor has no model selectors
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decoded GPU selectors, keyed by lowercase vendor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuAttributes(BTreeMap<String, GpuModels>);

impl GpuAttributes {
    /// Decode GPU selectors from an attribute list.
    ///
    /// Duplicate `(vendor, model)` entries merge; conflicting ram or
    /// interface constraints for the same pair are an error.
    pub fn parse(attrs: &Attributes) -> Result<Self> {
        let mut vendors: BTreeMap<String, GpuModels> = BTreeMap::new();

        for attr in attrs {
            let (vendor, model, spec) = parse_selector_key(&attr.key)?;

            let models = vendors.entry(vendor).or_default();
            match models.0.entry(model) {
                Entry::Vacant(entry) => {
                    entry.insert(spec);
                }
                Entry::Occupied(mut entry) => {
                    merge_spec(&attr.key, entry.get_mut(), spec)?;
                }
            }
        }

        Ok(Self(vendors))
    }

    /// Look up the model selectors for a vendor (compared lowercase)
    pub fn vendor(&self, vendor: &str) -> Option<&GpuModels> {
        self.0.get(&vendor.to_lowercase())
    }

    /// Whether no selectors were supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_selector_key(key: &str) -> Result<(String, String, GpuModelSpec)> {
    let tokens: Vec<&str> = key.split('/').collect();

    if tokens.len() < 4 || tokens.len() % 2 != 0 {
        return Err(Error::invalid_attributes(format!(
            "malformed gpu selector {:?}",
            key
        )));
    }

    if tokens[0] != "vendor" || tokens[2] != "model" {
        return Err(Error::invalid_attributes(format!(
            "malformed gpu selector {:?}",
            key
        )));
    }

    let vendor = tokens[1].to_lowercase();
    let model = tokens[3].to_string();

    if vendor.is_empty() || model.is_empty() {
        return Err(Error::invalid_attributes(format!(
            "empty vendor or model in gpu selector {:?}",
            key
        )));
    }

    let mut spec = GpuModelSpec::default();

    for pair in tokens[4..].chunks(2) {
        let (token, value) = (pair[0], pair[1]);

        if value.is_empty() {
            return Err(Error::invalid_attributes(format!(
                "empty {} in gpu selector {:?}",
                token, key
            )));
        }

        match token {
            "ram" if spec.ram.is_none() => spec.ram = Some(value.to_string()),
            "interface" if spec.interface.is_none() => spec.interface = Some(value.to_string()),
            "ram" | "interface" => {
                return Err(Error::invalid_attributes(format!(
                    "duplicate {} in gpu selector {:?}",
                    token, key
                )));
            }
            _ => {
                return Err(Error::invalid_attributes(format!(
                    "unknown token {:?} in gpu selector {:?}",
                    token, key
                )));
            }
        }
    }

    Ok((vendor, model, spec))
}

fn merge_spec(key: &str, existing: &mut GpuModelSpec, incoming: GpuModelSpec) -> Result<()> {
    match (&existing.ram, incoming.ram) {
        (Some(a), Some(b)) if *a != b => {
            return Err(Error::invalid_attributes(format!(
                "conflicting ram in gpu selector {:?}",
                key
            )));
        }
        (None, Some(b)) => existing.ram = Some(b),
        _ => {}
    }

    match (&existing.interface, incoming.interface) {
        (Some(a), Some(b)) if *a != b => {
            return Err(Error::invalid_attributes(format!(
                "conflicting interface in gpu selector {:?}",
                key
            )));
        }
        (None, Some(b)) => existing.interface = Some(b),
        _ => {}
    }

    Ok(())
}
