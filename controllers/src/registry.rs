//! I/O controller registry for automatic front-end discovery.
//!
//! Each front-end-capable controller self-registers via [`inventory::submit!`]
//! with an [`IoControllerEntry`] containing its CLI name and a factory
//! function. The front-end discovers available controllers at runtime
//! without any central list.

use cadence_core::core::SharedController;

/// Describes a front-end-capable I/O controller.
pub struct IoControllerEntry {
    /// CLI name used to select this controller (e.g., "cpm").
    pub name: &'static str,
    /// One-line summary for `--help` style listings.
    pub description: &'static str,
    /// Factory: construct a fresh controller.
    pub create: fn() -> SharedController,
}

impl IoControllerEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        create: fn() -> SharedController,
    ) -> Self {
        Self {
            name,
            description,
            create,
        }
    }
}

inventory::collect!(IoControllerEntry);

/// Return all registered controllers, sorted by name.
pub fn all() -> Vec<&'static IoControllerEntry> {
    let mut entries: Vec<_> = inventory::iter::<IoControllerEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a controller by its CLI name.
pub fn find(name: &str) -> Option<&'static IoControllerEntry> {
    inventory::iter::<IoControllerEntry>
        .into_iter()
        .find(|e| e.name == name)
}
