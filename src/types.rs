//! Core data types shared by the diversion engine and its collaborators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of an indexed record (a post id on the platform side).
pub type EntityId = u64;

/// Identifier of a tenant (a site in a multi-site network).
pub type TenantId = u64;

/// The author of a document as the search index stores it.
///
/// Only `id` survives into realized records; the other attributes are kept so
/// hits deserialize without loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  pub id: u64,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub login: Option<String>,
  #[serde(default)]
  pub raw: Option<String>,
}

/// One indexed record as returned by the search backend.
///
/// Field names follow the platform's post schema so hits can be deserialized
/// straight from the backend's `_source` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub post_id: EntityId,
  #[serde(default)]
  pub post_parent: EntityId,
  /// Origin tenant. Absent means the document belongs to the current tenant.
  #[serde(default)]
  pub site_id: Option<TenantId>,
  #[serde(default)]
  pub post_type: Option<String>,
  #[serde(default)]
  pub post_author: Option<Author>,
  #[serde(default)]
  pub post_name: Option<String>,
  #[serde(default)]
  pub post_status: Option<String>,
  #[serde(default)]
  pub post_title: Option<String>,
  #[serde(default)]
  pub post_content: Option<String>,
  #[serde(default)]
  pub post_excerpt: Option<String>,
  #[serde(default)]
  pub post_date: Option<String>,
  #[serde(default)]
  pub post_date_gmt: Option<String>,
  #[serde(default)]
  pub post_modified: Option<String>,
  #[serde(default)]
  pub post_modified_gmt: Option<String>,
  #[serde(default)]
  pub post_mime_type: Option<String>,
  #[serde(default)]
  pub comment_count: Option<u64>,
  #[serde(default)]
  pub comment_status: Option<String>,
  #[serde(default)]
  pub ping_status: Option<String>,
  #[serde(default)]
  pub menu_order: Option<i64>,
  #[serde(default)]
  pub permalink: Option<String>,
  #[serde(default)]
  pub terms: Option<Value>,
  #[serde(default)]
  pub post_meta: Option<Value>,
  #[serde(default)]
  pub meta: Option<Value>,
}

impl Document {
  /// Creates a document with only an identifier set.
  pub fn new(post_id: EntityId) -> Self {
    Self {
      post_id,
      ..Self::default()
    }
  }

  /// Sets the parent identifier.
  pub fn with_parent(mut self, parent: EntityId) -> Self {
    self.post_parent = parent;
    self
  }

  /// Sets the origin tenant.
  pub fn with_site(mut self, site_id: TenantId) -> Self {
    self.site_id = Some(site_id);
    self
  }
}

/// The result envelope produced once per diverted query by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchEnvelope {
  /// Total number of matching documents, across all pages.
  pub found_documents: u64,
  /// The documents of the requested page, in relevance order.
  #[serde(default)]
  pub documents: Vec<Document>,
}

/// The record shape a query asks for through its `fields` variable.
///
/// Deserializes from the raw parameter through [`FieldShape::from_param`],
/// so values the engine does not know select full records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldShape {
  /// Full post-like records.
  #[default]
  Full,
  /// Bare identifiers.
  Ids,
  /// Identifier plus parent identifier.
  IdParent,
}

impl FieldShape {
  /// Parses the platform's `fields` parameter. Anything unrecognised is `Full`.
  pub fn from_param(param: &str) -> Self {
    match param {
      "ids" => FieldShape::Ids,
      "id=>parent" => FieldShape::IdParent,
      _ => FieldShape::Full,
    }
  }

  /// The parameter value selecting this shape.
  pub fn as_param(self) -> &'static str {
    match self {
      FieldShape::Full => "all",
      FieldShape::Ids => "ids",
      FieldShape::IdParent => "id=>parent",
    }
  }

  /// Returns `true` for the shapes the platform short-circuits on.
  pub fn is_partial(self) -> bool {
    matches!(self, FieldShape::Ids | FieldShape::IdParent)
  }
}

impl From<String> for FieldShape {
  fn from(param: String) -> Self {
    FieldShape::from_param(&param)
  }
}

impl From<FieldShape> for String {
  fn from(shape: FieldShape) -> Self {
    shape.as_param().to_string()
  }
}

/// A pass-through field that may be copied from a document into a full record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnField {
  PostType,
  /// Copied as the author's identifier only.
  PostAuthor,
  PostName,
  PostStatus,
  PostTitle,
  PostParent,
  PostContent,
  PostExcerpt,
  PostDate,
  PostDateGmt,
  PostModified,
  PostModifiedGmt,
  PostMimeType,
  CommentCount,
  CommentStatus,
  PingStatus,
  MenuOrder,
  Permalink,
  Terms,
  PostMeta,
  Meta,
}

impl ReturnField {
  /// Every known field, in the order the platform lists them.
  pub const ALL: [ReturnField; 21] = [
    ReturnField::PostType,
    ReturnField::PostAuthor,
    ReturnField::PostName,
    ReturnField::PostStatus,
    ReturnField::PostTitle,
    ReturnField::PostParent,
    ReturnField::PostContent,
    ReturnField::PostExcerpt,
    ReturnField::PostDate,
    ReturnField::PostDateGmt,
    ReturnField::PostModified,
    ReturnField::PostModifiedGmt,
    ReturnField::PostMimeType,
    ReturnField::CommentCount,
    ReturnField::CommentStatus,
    ReturnField::PingStatus,
    ReturnField::MenuOrder,
    ReturnField::Permalink,
    ReturnField::Terms,
    ReturnField::PostMeta,
    ReturnField::Meta,
  ];

  /// The default allow-list used when building full records.
  pub fn defaults() -> Vec<ReturnField> {
    Self::ALL.to_vec()
  }
}

/// A post-like record rebuilt from a search hit.
///
/// Pass-through fields are `None` unless they were both allow-listed and
/// present on the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullRecord {
  pub id: EntityId,
  /// Tenant the record originates from.
  pub site_id: TenantId,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_author: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_status: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_parent: Option<EntityId>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_content: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_excerpt: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_date_gmt: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_modified: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_modified_gmt: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_mime_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment_count: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment_status: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ping_status: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub menu_order: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub permalink: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub terms: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_meta: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meta: Option<Value>,
  /// Marks records that came from the search index rather than the database.
  pub elasticsearch: bool,
}

/// Identifier plus parent, the `id=>parent` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdParentRecord {
  pub id: EntityId,
  pub post_parent: EntityId,
  pub elasticsearch: bool,
}

/// A record in one of the three shapes the platform's consumers accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RealizedRecord {
  Full(FullRecord),
  Id(EntityId),
  IdParent(IdParentRecord),
}

impl RealizedRecord {
  /// The record's identifier, whatever its shape.
  pub fn id(&self) -> EntityId {
    match self {
      RealizedRecord::Full(record) => record.id,
      RealizedRecord::Id(id) => *id,
      RealizedRecord::IdParent(record) => record.id,
    }
  }

  /// The shape this record is in.
  pub fn shape(&self) -> FieldShape {
    match self {
      RealizedRecord::Full(_) => FieldShape::Full,
      RealizedRecord::Id(_) => FieldShape::Ids,
      RealizedRecord::IdParent(_) => FieldShape::IdParent,
    }
  }

  /// The origin tenant, known only for full records.
  pub fn site_id(&self) -> Option<TenantId> {
    match self {
      RealizedRecord::Full(record) => Some(record.site_id),
      _ => None,
    }
  }
}

/// The post-type constraint of a query.
///
/// The platform accepts either a single type name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostTypeFilter {
  One(String),
  Many(Vec<String>),
}

impl PostTypeFilter {
  /// The sentinel meaning "no type constraint".
  pub const ANY: &'static str = "any";

  /// Returns `true` for the `any` sentinel.
  pub fn is_any(&self) -> bool {
    matches!(self, PostTypeFilter::One(name) if name == Self::ANY)
  }

  /// Returns `true` when the filter names no type at all.
  pub fn is_empty(&self) -> bool {
    match self {
      PostTypeFilter::One(name) => name.is_empty(),
      PostTypeFilter::Many(names) => names.is_empty(),
    }
  }
}

/// Which tenants a search covers.
///
/// The platform's `sites` variable is either a keyword (`current`, `all`),
/// a single tenant id or a list of ids. Numeric strings count as ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScope", into = "RawScope")]
pub enum SearchScope {
  /// Only the tenant that is active when the query runs.
  #[default]
  Current,
  /// Every tenant in the network.
  All,
  /// A single tenant.
  Site(TenantId),
  /// An explicit set of tenants.
  Sites(Vec<TenantId>),
}

impl SearchScope {
  /// Returns `true` for a tenant list naming no tenant.
  pub fn is_empty(&self) -> bool {
    matches!(self, SearchScope::Sites(ids) if ids.is_empty())
  }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawScope {
  Keyword(String),
  Site(TenantId),
  Sites(Vec<TenantId>),
}

impl TryFrom<RawScope> for SearchScope {
  type Error = String;

  fn try_from(raw: RawScope) -> Result<Self, Self::Error> {
    match raw {
      RawScope::Keyword(keyword) => match keyword.as_str() {
        "current" => Ok(SearchScope::Current),
        "all" => Ok(SearchScope::All),
        other => other
          .parse()
          .map(SearchScope::Site)
          .map_err(|_| format!("unknown site scope `{other}`")),
      },
      RawScope::Site(id) => Ok(SearchScope::Site(id)),
      RawScope::Sites(ids) => Ok(SearchScope::Sites(ids)),
    }
  }
}

impl From<SearchScope> for RawScope {
  fn from(scope: SearchScope) -> Self {
    match scope {
      SearchScope::Current => RawScope::Keyword("current".into()),
      SearchScope::All => RawScope::Keyword("all".into()),
      SearchScope::Site(id) => RawScope::Site(id),
      SearchScope::Sites(ids) => RawScope::Sites(ids),
    }
  }
}
