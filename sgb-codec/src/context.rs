//! Format context supplied by the owning document
//!
//! The codec never stores the active format version itself; it derives
//! per-stream flags from this trait at construction and again whenever the
//! header callback changes the version.

/// The document-side collaborator the codec consults for version-dependent
/// behavior.
pub trait FormatContext {
    /// The active packed format version.
    fn version(&self) -> u32;

    /// Whether this document uses the scene schema family.
    ///
    /// The 32-bit-boolean and link-adjustment rules apply only to scene
    /// documents; auxiliary schema families share field tags but not these
    /// historical quirks.
    fn is_scene_document(&self) -> bool;

    /// The document's current header string, if one has been registered.
    /// Consulted by the encoder's version-field compatibility shim.
    fn header_string(&self) -> Option<String>;

    /// Register a decoded header string and the version word that follows
    /// it. The document may reject the string by returning false; on
    /// acceptance it typically adopts `version` as the active version.
    fn set_header_string(&mut self, text: &str, version: u32) -> bool;
}
