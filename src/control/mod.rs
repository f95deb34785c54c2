//! Actuation control.
//!
//! [`engine::DecisionEngine`] turns a stored sample into a [`engine::Directive`]
//! and applies it to the actuator registry.

pub mod engine;
