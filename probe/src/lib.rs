//! # Scene Probe
//!
//! Entity lookup, type resolution and path-based property mutation for a live object graph.
//!
//! The crate never owns the graph. A host application implements the collaborator traits in
//! [`host`] and lends them to a [`Probe`] session per call. The session resolves entities by
//! heterogeneous criteria, resolves short or fully-qualified type names against the host's type
//! universe, converts untyped JSON tokens into strongly-typed member values and writes them
//! through dotted, indexed member paths such as `settings.layers[2].weight`.
//!
//! # Usage
//!
//! ```
//! use scene_probe::host::Host;
//! use scene_probe::memory::{MemoryCatalog, MemoryResources, MemoryScene, RecordingObserver};
//! use scene_probe::{Probe, ProbeConfig};
//! use serde_json::json;
//!
//! let mut scene = MemoryScene::new();
//! let catalog = MemoryCatalog::new();
//! let resources = MemoryResources::new();
//! let mut observer = RecordingObserver::new();
//! let mut host = Host::new(&mut scene, &catalog, &resources, &mut observer);
//!
//! let mut probe = Probe::new(ProbeConfig::default());
//! let response = probe.execute(&mut host, "create", json!({ "name": "Player" }));
//! assert!(response.success);
//!
//! let found = probe.execute(&mut host, "find", json!({ "search_term": "Player" }));
//! assert_eq!(found.data.unwrap()["count"], 1);
//! ```
//!
//! # Operations
//!
//! `find`, `read_capabilities`, `read_capability`, `create`, `modify`, `delete`, `duplicate`,
//! `add_capability`, `remove_capability`, `set_capability_properties` and `move_relative`.
//! See [`facade::Action`] for accepted names and [`facade`] for the parameter structs.

pub mod config;
pub mod constants;
pub mod entity_resolver;
pub mod error;
pub mod facade;
pub mod host;
pub mod logging;
pub mod memory;
pub mod model;
pub mod path_mutator;
pub mod suggest;
pub mod type_resolver;
pub mod value_coercer;

pub use config::ProbeConfig;
pub use error::{Error, ErrorKind, Result};
pub use facade::{Action, CommandResponse, Probe};
pub use host::Host;
