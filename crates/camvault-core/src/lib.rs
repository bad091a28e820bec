//! CamVault Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain values** - `Credential`, `TokenPair`, `CameraName`, `RemoteFolderPath`,
//!   `RemotePictureName`, `TickSource`, `TelemetryEvent`
//! - **Port definitions** - Traits for adapters: `ICredentialStore`, `IPictureBuffer`,
//!   `ITelemetrySink`
//! - **Configuration** - YAML-backed settings with defaults, validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure values with no I/O. Ports define trait
//! interfaces that adapter crates (`camvault-onedrive`, `camvault-sync`,
//! `camvault-telemetry`) implement.

pub mod config;
pub mod domain;
pub mod ports;
