//! Structural code-metadata records.
//!
//! These mirror the JSON emitted by the external metadata generator; they
//! are looked up by file path and rendered into prompt enrichment text.
//! Unknown JSON shapes are rejected at the boundary by serde.

use serde::{Deserialize, Serialize};

/// A function or method parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A standalone function (or the function part of a method).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
    #[serde(rename = "return-types", default)]
    pub return_types: Vec<String>,
    #[serde(default)]
    pub body: String,
}

/// A method: a function plus its receiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodRecord {
    #[serde(default)]
    pub receiver: String,
    #[serde(flatten)]
    pub function: FunctionRecord,
}

/// A named struct/class field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A class with its fields and methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
    #[serde(default)]
    pub methods: Vec<MethodRecord>,
}

/// An interface with its method signatures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<FunctionRecord>,
}

/// Everything known about one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub classes: Vec<ClassRecord>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceRecord>,
    #[serde(default)]
    pub functions: Vec<FunctionRecord>,
}
