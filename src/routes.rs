//! Request builders and body shapes for the index server's routes.
//!
//! The server dispatches on `(path, method)`:
//! - `/index/search` GET: full-text query, answers with matching files
//! - `/index/file` POST: add a file to the index
//! - `/index/file` DELETE: remove a file from the index
//! - `/index/file` GET: fetch a file's content

use crate::envelope::{Method, Request};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Search route path.
pub const SEARCH_PATH: &str = "/index/search";

/// File management route path.
pub const FILE_PATH: &str = "/index/file";

/// Body of a search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// Body of the file add/remove/download requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(rename = "fileName")]
    pub file_name: String,
}

/// Search response body: files matching the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub files: Vec<String>,
}

/// Download response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(rename = "fileContent")]
    pub file_content: String,
}

/// Outcome message attached to add/remove responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

/// Search the index for files matching `query`.
pub fn search(query: &str) -> Request {
    Request::new(Method::Get, SEARCH_PATH, json!({ "query": query }))
}

/// Add a file to the index.
pub fn add_file(file_name: &str) -> Request {
    Request::new(Method::Post, FILE_PATH, json!({ "fileName": file_name }))
}

/// Remove a file from the index.
pub fn remove_file(file_name: &str) -> Request {
    Request::new(Method::Delete, FILE_PATH, json!({ "fileName": file_name }))
}

/// Fetch a file's content.
pub fn download(file_name: &str) -> Request {
    Request::new(Method::Get, FILE_PATH, json!({ "fileName": file_name }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_search_request() {
        let request = search("mr");
        assert_eq!(request.meta.path, SEARCH_PATH);
        assert_eq!(request.meta.method, Method::Get);
        assert_eq!(request.body, json!({"query": "mr"}));

        let query: SearchQuery = serde_json::from_value(request.body).unwrap();
        assert_eq!(query.query, "mr");
    }

    #[test]
    fn test_file_requests_share_path() {
        let add = add_file("resources/test/0_2.txt");
        let remove = remove_file("resources/test/0_2.txt");
        let get = download("resources/test/0_2.txt");

        for request in [&add, &remove, &get] {
            assert_eq!(request.meta.path, FILE_PATH);
            assert_eq!(request.body["fileName"], json!("resources/test/0_2.txt"));
        }
        assert_eq!(add.meta.method, Method::Post);
        assert_eq!(remove.meta.method, Method::Delete);
        assert_eq!(get.meta.method, Method::Get);
    }

    #[test]
    fn test_file_ref_field_name() {
        let body = serde_json::to_value(FileRef {
            file_name: "a.txt".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"fileName": "a.txt"}));
    }

    #[test]
    fn test_response_body_shapes() {
        let result: SearchResult =
            serde_json::from_value(json!({"files": ["x.txt"]})).unwrap();
        assert_eq!(result.files, vec!["x.txt"]);

        let content: FileContent =
            serde_json::from_value(json!({"fileContent": "hello"})).unwrap();
        assert_eq!(content.file_content, "hello");

        let message: StatusMessage =
            serde_json::from_value(json!({"message": "added"})).unwrap();
        assert_eq!(message.message, "added");

        let raw: Value = serde_json::to_value(SearchResult { files: vec![] }).unwrap();
        assert_eq!(raw, json!({"files": []}));
    }
}
