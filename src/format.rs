//! Turns search hits into the record shapes the platform consumes.
//!
//! Everything here is pure and order-preserving: output record `i` always
//! comes from input document (or cached record) `i`.

use crate::types::{
  Document, FieldShape, FullRecord, IdParentRecord, RealizedRecord, ReturnField, TenantId,
};

/// Formats documents into the given shape.
///
/// `current_tenant` is the origin assigned to documents that carry no
/// `site_id`; `return_fields` is the allow-list used for full records.
pub fn format_hits(
  documents: &[Document],
  shape: FieldShape,
  current_tenant: TenantId,
  return_fields: &[ReturnField],
) -> Vec<RealizedRecord> {
  match shape {
    FieldShape::Full => format_hits_as_posts(documents, current_tenant, return_fields),
    FieldShape::Ids => format_hits_as_ids(documents),
    FieldShape::IdParent => format_hits_as_id_parents(documents),
  }
}

/// Builds full records, copying only allow-listed fields.
pub fn format_hits_as_posts(
  documents: &[Document],
  current_tenant: TenantId,
  return_fields: &[ReturnField],
) -> Vec<RealizedRecord> {
  documents
    .iter()
    .map(|doc| RealizedRecord::Full(full_record(doc, current_tenant, return_fields)))
    .collect()
}

pub fn format_hits_as_ids(documents: &[Document]) -> Vec<RealizedRecord> {
  documents
    .iter()
    .map(|doc| RealizedRecord::Id(doc.post_id))
    .collect()
}

pub fn format_hits_as_id_parents(documents: &[Document]) -> Vec<RealizedRecord> {
  documents
    .iter()
    .map(|doc| {
      RealizedRecord::IdParent(IdParentRecord {
        id: doc.post_id,
        post_parent: doc.post_parent,
        elasticsearch: true,
      })
    })
    .collect()
}

/// Re-derives a narrower shape from records that were already realized.
///
/// Full records can be narrowed to either partial shape and `id=>parent`
/// records to bare ids. A record cannot be widened: when the target shape
/// needs data the record no longer has, it is returned unchanged.
pub fn reshape_cached(records: &[RealizedRecord], shape: FieldShape) -> Vec<RealizedRecord> {
  records
    .iter()
    .map(|record| match (shape, record) {
      (FieldShape::Ids, _) => RealizedRecord::Id(record.id()),
      (FieldShape::IdParent, RealizedRecord::Full(full)) => {
        RealizedRecord::IdParent(IdParentRecord {
          id: full.id,
          post_parent: full.post_parent.unwrap_or_default(),
          elasticsearch: full.elasticsearch,
        })
      }
      _ => record.clone(),
    })
    .collect()
}

fn full_record(doc: &Document, current_tenant: TenantId, return_fields: &[ReturnField]) -> FullRecord {
  let mut record = FullRecord {
    id: doc.post_id,
    site_id: doc.site_id.filter(|&id| id != 0).unwrap_or(current_tenant),
    elasticsearch: true,
    ..FullRecord::default()
  };

  for field in return_fields {
    match field {
      ReturnField::PostType => record.post_type = doc.post_type.clone(),
      ReturnField::PostAuthor => record.post_author = doc.post_author.as_ref().map(|a| a.id),
      ReturnField::PostName => record.post_name = doc.post_name.clone(),
      ReturnField::PostStatus => record.post_status = doc.post_status.clone(),
      ReturnField::PostTitle => record.post_title = doc.post_title.clone(),
      ReturnField::PostParent => record.post_parent = Some(doc.post_parent),
      ReturnField::PostContent => record.post_content = doc.post_content.clone(),
      ReturnField::PostExcerpt => record.post_excerpt = doc.post_excerpt.clone(),
      ReturnField::PostDate => record.post_date = doc.post_date.clone(),
      ReturnField::PostDateGmt => record.post_date_gmt = doc.post_date_gmt.clone(),
      ReturnField::PostModified => record.post_modified = doc.post_modified.clone(),
      ReturnField::PostModifiedGmt => record.post_modified_gmt = doc.post_modified_gmt.clone(),
      ReturnField::PostMimeType => record.post_mime_type = doc.post_mime_type.clone(),
      ReturnField::CommentCount => record.comment_count = doc.comment_count,
      ReturnField::CommentStatus => record.comment_status = doc.comment_status.clone(),
      ReturnField::PingStatus => record.ping_status = doc.ping_status.clone(),
      ReturnField::MenuOrder => record.menu_order = doc.menu_order,
      ReturnField::Permalink => record.permalink = doc.permalink.clone(),
      ReturnField::Terms => record.terms = doc.terms.clone(),
      ReturnField::PostMeta => record.post_meta = doc.post_meta.clone(),
      ReturnField::Meta => record.meta = doc.meta.clone(),
    }
  }

  record
}
