//! Vault object and field API names used by the PMF artwork workflow.

/// Document fields.
pub mod doc {
    /// Logical document id.
    pub const ID: &str = "id";
    /// Compound version id.
    pub const VERSION_ID: &str = "version_id";
    /// Major version number.
    pub const MAJOR: &str = "major_version_number__v";
    /// Minor version number.
    pub const MINOR: &str = "minor_version_number__v";
    /// Lifecycle state.
    pub const STATUS: &str = "status__v";
    /// Document name.
    pub const NAME: &str = "name__v";
    /// Document title.
    pub const TITLE: &str = "title__v";
    /// Document number.
    pub const NUMBER: &str = "document_number__v";
    /// Owner user id.
    pub const OWNER: &str = "owner__v";
    /// Document type.
    pub const TYPE: &str = "type__v";
    /// Document lifecycle.
    pub const LIFECYCLE: &str = "lifecycle__v";
    /// Back-reference to the PMF that caused this version.
    pub const PMF: &str = "pmf__c";
    /// Link to the redline companion document.
    pub const ANNOTATED_VERSION: &str = "pmf_annotated_version__c";
    /// On redline documents: the artwork version they were copied from.
    pub const ARTWORK_VERSION_ID: &str = "artwork_version_id__c";
}

/// The PMF change request object.
pub mod pmf {
    /// Object name.
    pub const OBJECT: &str = "pmf__c";
    /// Record id.
    pub const ID: &str = "id";
    /// PMF display name.
    pub const NAME: &str = "name__v";
    /// User id of the requestor.
    pub const REQUESTOR: &str = "pmf_requestor__c";
}

/// Join object created when a user selects an artwork for a PMF.
pub mod artwork_link {
    /// Object name.
    pub const OBJECT: &str = "pmf_artwork_document__c";
    /// Record id.
    pub const ID: &str = "id";
    /// Owning PMF.
    pub const PMF: &str = "pmf__c";
    /// Snapshot artwork version id.
    pub const ARTWORK_DOCUMENT: &str = "artwork_document__c";
    /// Document number of the artwork.
    pub const DOCUMENT_NUMBER: &str = "document_number__c";
    /// Brand display value.
    pub const BRAND: &str = "brand__c";
    /// Packaging type display value.
    pub const PACKAGING_TYPE: &str = "packaging_type__c";
    /// Packaging number.
    pub const PACKAGING_NUMBER: &str = "packaging_number__c";
}

/// Link record between a PMF artwork link and its redline companion document.
pub mod redline_link {
    /// Object name.
    pub const OBJECT: &str = "pmf_redline_artwork_document__c";
    /// Record id.
    pub const ID: &str = "id";
    /// Owning PMF.
    pub const PMF: &str = "pmf__c";
    /// Version id of the redline document.
    pub const REDLINE_DOCUMENT: &str = "redline_artwork_document__c";
    /// Id string of the PMF artwork link (not a managed reference).
    pub const ARTWORK_LINK_ID: &str = "pmf_artwork_document_record_id__c";
    /// Artwork document number.
    pub const ARTWORK_DOCUMENT_NUMBER: &str = "artwork_document_number__c";
    /// Brand display value.
    pub const BRAND: &str = "brand__c";
    /// Packaging type display value.
    pub const PACKAGING_TYPE: &str = "packaging_type__c";
    /// Packaging number.
    pub const PACKAGING_NUMBER: &str = "packaging_number__c";
}

/// Audit record linking a PMF to a draft version it produced or adopted.
pub mod versioned_artwork {
    /// Object name.
    pub const OBJECT: &str = "pmf_upversioned_artwork__c";
    /// Record id.
    pub const ID: &str = "id";
    /// Owning PMF.
    pub const PMF: &str = "pmf__c";
    /// The new artwork version id.
    pub const NEW_VERSION: &str = "new_artwork_version__c";
    /// Artwork document number.
    pub const DOCUMENT_NUMBER: &str = "document_number__c";
}

/// Admin-maintained parameter sets.
pub mod parameter_set {
    /// Object name.
    pub const OBJECT: &str = "vproc_parameter_set__c";
    /// Parameter set key.
    pub const NAME: &str = "name__v";
    /// Serialized artwork field definitions.
    pub const ARTWORK_FIELDS: &str = "artwork_fields__c";
}

/// Parameters of the draft-review workflow.
pub mod workflow {
    /// Documents to route.
    pub const DOCUMENTS: &str = "documents__sys";
    /// Participant group receiving the document owner.
    pub const DOCUMENT_OWNER: &str = "part_document_owner__c";
    /// Workflow description.
    pub const DESCRIPTION: &str = "description__sys";
}
