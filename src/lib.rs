//! Generate Java message classes from ROS message descriptors.
//!
//! `rosmsg-java-gen` turns ROS message type definitions into Java classes
//! that serialize to and from JSON through Gson, so a JVM client can talk
//! to a rosbridge-style server with typed messages.
//!
//! # Features
//!
//! - One class per unique message type, shared across every root requested
//! - Transitive resolution of nested message types
//! - Fixed-size arrays, variable-length lists and nested messages
//! - `time`/`duration` fields typed as generated `rostime/Time` and
//!   `rostime/Duration` classes, each holding `int secs` and `int nsecs`
//! - Exclusion of types the target project already provides
//! - Descriptors from a JSON bundle or from `.msg` files
//! - Deterministic output: byte-identical across runs
//!
//! # Usage
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use std::path::Path;
//!
//! use rosmsg_java_gen::codegen::{self, NamingContext};
//!
//! let bundle = rosmsg_java_gen::schema::load_bundle(Path::new("descriptors.json"))?;
//! let ctx = NamingContext::new("frc/team88/ros/messages", "frc.team88.ros", BTreeSet::new());
//! let generation = codegen::generate(&bundle, &["nav_msgs/Odometry".to_string()], &ctx)?;
//! codegen::write_files(Path::new("src/main/java/frc/team88/ros/messages"), &generation.files)?;
//! eprintln!("Generated {} classes", generation.stats.classes_emitted);
//! # Ok::<(), rosmsg_java_gen::error::Error>(())
//! ```

pub mod class_tree;
pub mod codegen;
pub mod config;
pub mod error;
pub mod msg_file;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod type_map;
