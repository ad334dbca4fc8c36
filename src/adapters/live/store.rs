//! Live `RecordStore` backed by the vault REST API.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::client::{error_message, VaultClient};
use crate::names::doc;
use crate::ports::{FileSource, PortError, PortFuture, RecordStore, SaveResult};
use crate::query::Query;
use crate::record::{Fields, Row};
use crate::version::VersionId;

/// Reads and writes through the vault REST API.
pub struct LiveVaultStore {
    client: VaultClient,
}

impl LiveVaultStore {
    /// Creates a store using `client`.
    #[must_use]
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Row>, PortError> {
        let vql = query.to_vql();
        debug!(%vql, "Executing VQL query");
        let mut page = self.client.post_form("/query", &[("q".to_string(), vql)]).await?;
        let mut rows = Vec::new();
        loop {
            rows.extend(rows_of(&page));
            let next = page
                .pointer("/responseDetails/next_page")
                .and_then(Value::as_str)
                .map(str::to_string);
            match next {
                Some(next) => page = self.client.get(&next).await?,
                None => break,
            }
        }
        debug!(count = rows.len(), "VQL result count");
        Ok(rows)
    }

    async fn head_version(&self, document_id: &str) -> Result<VersionId, PortError> {
        let query = Query::documents()
            .select(doc::VERSION_ID)
            .where_eq(doc::ID, crate::query::Param::id(document_id));
        let rows = self.run_query(&query).await?;
        let version_id = rows
            .first()
            .and_then(|r| r.text(doc::VERSION_ID))
            .ok_or_else(|| format!("document {document_id} not found"))?;
        VersionId::parse(&version_id).map_err(Into::into)
    }

    async fn source_file(&self, source: &FileSource) -> Result<(Vec<u8>, String), PortError> {
        let (version, path) = match source {
            FileSource::Version(v) => (v, format!("{}/file", version_path(v))),
            FileSource::Rendition { version, rendition } => {
                (version, format!("{}/renditions/{rendition}", version_path(version)))
            }
        };
        let bytes = self.client.get_bytes(&path).await?;
        Ok((bytes, format!("{version}.pdf")))
    }

    async fn do_create_version(
        &self,
        document_id: &str,
        fields: &Fields,
    ) -> Result<SaveResult, PortError> {
        let mut form = form_fields(fields);
        form.push(("createDraft".to_string(), "latestContent".to_string()));
        let path = format!("/objects/documents/{document_id}");
        let body = match self.client.post_form(&path, &form).await {
            Ok(body) => body,
            Err(e) => return Ok(SaveResult::rejected(e.to_string())),
        };
        Ok(save_result(&body, document_id))
    }

    async fn do_update_version(
        &self,
        document_id: &str,
        fields: &Fields,
    ) -> Result<SaveResult, PortError> {
        let form = form_fields(fields);
        let path = format!("/objects/documents/{document_id}");
        if let Err(e) = self.client.put_form(&path, &form).await {
            return Ok(SaveResult::rejected(e.to_string()));
        }
        Ok(SaveResult::saved(self.head_version(document_id).await?))
    }

    async fn do_create_document(
        &self,
        fields: &Fields,
        source: &FileSource,
    ) -> Result<SaveResult, PortError> {
        let (bytes, file_name) = self.source_file(source).await?;
        let mut form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        for (name, value) in form_fields(fields) {
            form = form.text(name, value);
        }
        let body = match self.client.post_multipart("/objects/documents", form).await {
            Ok(body) => body,
            Err(e) => return Ok(SaveResult::rejected(e.to_string())),
        };
        let id = body.get("id").map(value_text).unwrap_or_default();
        Ok(save_result(&body, &id))
    }

    async fn do_create_record(&self, object: &str, fields: &Fields) -> Result<String, PortError> {
        let record: Map<String, Value> =
            fields.iter().map(|(name, value)| (name.clone(), value.to_json())).collect();
        let body = self.client.post_json(&format!("/vobjects/{object}"), &json!([record])).await?;
        let entry = body
            .pointer("/data/0")
            .ok_or_else(|| format!("no result returned creating {object} record"))?;
        if entry.get("responseStatus").and_then(Value::as_str) != Some("SUCCESS") {
            return Err(error_message(entry, "record not created").into());
        }
        let id = entry
            .pointer("/data/id")
            .map(value_text)
            .ok_or_else(|| format!("no id returned creating {object} record"))?;
        info!(object, id = %id, "Created record");
        Ok(id)
    }

    async fn do_grant_roles(
        &self,
        version: &VersionId,
        roles: &[String],
        group: &str,
    ) -> Result<(), PortError> {
        let form: Vec<(String, String)> =
            roles.iter().map(|role| (format!("{role}.groups"), group.to_string())).collect();
        let path = format!("/objects/documents/{}/roles", version.document_id);
        self.client.post_form(&path, &form).await?;
        Ok(())
    }

    async fn do_user_action(&self, version: &VersionId, action: &str) -> Result<(), PortError> {
        let path = format!("{}/lifecycle_actions/{action}", version_path(version));
        self.client.put_form(&path, &[]).await?;
        info!(%version, action, "Initiated document user action");
        Ok(())
    }
}

fn version_path(version: &VersionId) -> String {
    format!(
        "/objects/documents/{}/versions/{}/{}",
        version.document_id, version.major, version.minor
    )
}

fn form_fields(fields: &Fields) -> Vec<(String, String)> {
    fields
        .iter()
        .filter(|(name, _)| name.as_str() != doc::MAJOR && name.as_str() != doc::MINOR)
        .map(|(name, value)| (name.clone(), value.to_form_value()))
        .collect()
}

fn rows_of(page: &Value) -> Vec<Row> {
    page.get("data")
        .and_then(Value::as_array)
        .map(|data| {
            data.iter()
                .filter_map(|item| item.as_object().cloned().map(Row::from))
                .collect()
        })
        .unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads the created version out of a document save response.
fn save_result(body: &Value, document_id: &str) -> SaveResult {
    let number = |field: &str| {
        body.get(field)
            .map(value_text)
            .and_then(|s| s.parse::<u32>().ok())
    };
    match (number(doc::MAJOR), number(doc::MINOR)) {
        (Some(major), Some(minor)) if !document_id.is_empty() => {
            SaveResult::saved(VersionId::new(document_id, major, minor))
        }
        _ => SaveResult::default(),
    }
}

impl RecordStore for LiveVaultStore {
    fn query<'a>(&'a self, query: &'a Query) -> PortFuture<'a, Vec<Row>> {
        Box::pin(self.run_query(query))
    }

    fn create_version<'a>(
        &'a self,
        document_id: &'a str,
        fields: &'a Fields,
        _source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(self.do_create_version(document_id, fields))
    }

    fn update_version<'a>(
        &'a self,
        document_id: &'a str,
        fields: &'a Fields,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(self.do_update_version(document_id, fields))
    }

    fn create_document<'a>(
        &'a self,
        fields: &'a Fields,
        source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(self.do_create_document(fields, source))
    }

    fn create_record<'a>(&'a self, object: &'a str, fields: &'a Fields) -> PortFuture<'a, String> {
        Box::pin(self.do_create_record(object, fields))
    }

    fn grant_roles<'a>(
        &'a self,
        version: &'a VersionId,
        roles: &'a [String],
        group: &'a str,
    ) -> PortFuture<'a, ()> {
        Box::pin(self.do_grant_roles(version, roles, group))
    }

    fn user_action<'a>(&'a self, version: &'a VersionId, action: &'a str) -> PortFuture<'a, ()> {
        Box::pin(self.do_user_action(version, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    #[test]
    fn save_result_reads_version_numbers() {
        let body = json!({
            "responseStatus": "SUCCESS",
            "id": 1042,
            "major_version_number__v": 2,
            "minor_version_number__v": 1
        });
        assert_eq!(save_result(&body, "1042").first_success(), Some(&VersionId::new("1042", 2, 1)));
        let bare = json!({"responseStatus": "SUCCESS"});
        assert!(save_result(&bare, "1042").first_success().is_none());
    }

    #[test]
    fn version_numbers_are_not_sent_as_fields() {
        let mut fields = Fields::new();
        fields.insert(doc::MAJOR.into(), FieldValue::Number(2.0));
        fields.insert(doc::MINOR.into(), FieldValue::Number(1.0));
        fields.insert(doc::PMF.into(), FieldValue::reference("PMF-1"));
        assert_eq!(form_fields(&fields), vec![(doc::PMF.to_string(), "PMF-1".to_string())]);
    }

    #[test]
    fn rows_are_read_from_data() {
        let page = json!({
            "responseStatus": "SUCCESS",
            "data": [{"id": 1, "status__v": ["draft__c"]}]
        });
        let rows = rows_of(&page);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("status__v").as_deref(), Some("draft__c"));
    }
}
