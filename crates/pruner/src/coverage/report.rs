//! AltCover / OpenCover XML report schema
//!
//! Only the parts the normalizer reads are modelled; everything else in the
//! document is ignored by the deserializer. Every attribute is kept as raw
//! text so that one malformed value drops its own entry instead of failing
//! the whole report.
//!
//! ```text
//! CoverageSession
//! └── Modules/Module
//!     ├── Files/File                     @uid @fullPath
//!     ├── TrackedMethods/TrackedMethod   @uid @name
//!     └── Classes/Class/Methods/Method/SequencePoints/SequencePoint
//!             @sl @el @fileid            └── TrackedMethodRefs/TrackedMethodRef @uid
//! ```

use serde::Deserialize;

/// Root element of a coverage report
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverageSession {
    /// Instrumented assemblies
    #[serde(rename = "Modules", default)]
    pub modules: Option<Modules>,
}

impl CoverageSession {
    /// Parse a report document
    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// All modules, flattened
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().flat_map(|modules| modules.module.iter())
    }
}

/// `<Modules>` wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Modules {
    /// Instrumented assemblies
    #[serde(rename = "Module", default)]
    pub module: Vec<Module>,
}

/// One instrumented assembly
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Module {
    /// Source files referenced by sequence points
    #[serde(rename = "Files", default)]
    pub files: Option<Files>,
    /// Instrumented classes
    #[serde(rename = "Classes", default)]
    pub classes: Option<Classes>,
    /// Test methods recorded with call context
    #[serde(rename = "TrackedMethods", default)]
    pub tracked_methods: Option<TrackedMethods>,
}

impl Module {
    /// Source files of this module
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().flat_map(|files| files.file.iter())
    }

    /// Tracked (test) methods of this module
    pub fn tracked_methods(&self) -> impl Iterator<Item = &TrackedMethod> {
        self.tracked_methods
            .iter()
            .flat_map(|methods| methods.tracked_method.iter())
    }

    /// Every sequence point of every method of every class
    pub fn sequence_points(&self) -> impl Iterator<Item = &SequencePoint> {
        self.classes
            .iter()
            .flat_map(|classes| classes.class.iter())
            .flat_map(|class| class.methods.iter())
            .flat_map(|methods| methods.method.iter())
            .flat_map(|method| method.sequence_points.iter())
            .flat_map(|points| points.sequence_point.iter())
    }
}

/// `<Files>` wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Files {
    /// File entries
    #[serde(rename = "File", default)]
    pub file: Vec<FileEntry>,
}

/// `<File uid=".." fullPath=".."/>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileEntry {
    /// Report-scoped file id
    #[serde(rename = "@uid", default)]
    pub uid: Option<String>,
    /// Absolute path of the source file
    #[serde(rename = "@fullPath", default)]
    pub full_path: Option<String>,
}

/// `<TrackedMethods>` wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackedMethods {
    /// Tracked methods
    #[serde(rename = "TrackedMethod", default)]
    pub tracked_method: Vec<TrackedMethod>,
}

/// `<TrackedMethod uid=".." name="System.Void Ns.Type::Method()"/>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackedMethod {
    /// Report-scoped test id
    #[serde(rename = "@uid", default)]
    pub uid: Option<String>,
    /// Full method signature
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
}

/// `<Classes>` wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Classes {
    /// Classes
    #[serde(rename = "Class", default)]
    pub class: Vec<Class>,
}

/// One instrumented class
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Class {
    /// Methods of the class
    #[serde(rename = "Methods", default)]
    pub methods: Option<Methods>,
}

/// `<Methods>` wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Methods {
    /// Methods
    #[serde(rename = "Method", default)]
    pub method: Vec<Method>,
}

/// One instrumented method
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Method {
    /// Sequence points of the method body
    #[serde(rename = "SequencePoints", default)]
    pub sequence_points: Option<SequencePoints>,
}

/// `<SequencePoints>` wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SequencePoints {
    /// Sequence points
    #[serde(rename = "SequencePoint", default)]
    pub sequence_point: Vec<SequencePoint>,
}

/// A contiguous instrumented line range
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SequencePoint {
    /// Start line
    #[serde(rename = "@sl", default)]
    pub sl: Option<String>,
    /// End line
    #[serde(rename = "@el", default)]
    pub el: Option<String>,
    /// Uid of the [`FileEntry`] holding the lines
    #[serde(rename = "@fileid", default)]
    pub fileid: Option<String>,
    /// Tests that executed this point
    #[serde(rename = "TrackedMethodRefs", default)]
    pub tracked_method_refs: Option<TrackedMethodRefs>,
}

impl SequencePoint {
    /// Raw uids of the tests that executed this point
    pub fn tracked_method_uids(&self) -> impl Iterator<Item = &str> {
        self.tracked_method_refs
            .iter()
            .flat_map(|refs| refs.tracked_method_ref.iter())
            .filter_map(|reference| reference.uid.as_deref())
    }
}

/// `<TrackedMethodRefs>` wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackedMethodRefs {
    /// References
    #[serde(rename = "TrackedMethodRef", default)]
    pub tracked_method_ref: Vec<TrackedMethodRef>,
}

/// Reference to a [`TrackedMethod`] by uid
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackedMethodRef {
    /// Uid of the tracked method
    #[serde(rename = "@uid", default)]
    pub uid: Option<String>,
}
