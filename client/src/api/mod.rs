use std::error::Error as StdError;

use anyhow::Result;
use const_format::concatcp;
use displaydoc::Display;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ServerConfig;
use crate::version::ROLLBOOK_DISTRIBUTOR;
use rollbook::api::v1::attendance::{AttendanceQuery, SaveAttendanceRequest};
use rollbook::api::v1::auth::{AuthResponse, SignInRequest, SignUpRequest, User};
use rollbook::api::v1::marks::{CreateMarkRequest, MarksQuery};
use rollbook::api::v1::stats::{FacultyStats, StatsQuery};
use rollbook::api::v1::students::{StudentQuery, StudentRequest};
use rollbook::api::v1::subjects::CreateSubjectRequest;
use rollbook::api::v1::{ErrorResponse, Listing, OneOrMany};
use rollbook::attendance::AttendanceRecord;
use rollbook::id::RecordId;
use rollbook::marks::Mark;
use rollbook::student::Student;
use rollbook::subject::Subject;

/// The User-Agent string of Rollbook.
const ROLLBOOK_USER_AGENT: &str = concatcp!(
    "Rollbook/",
    env!("CARGO_PKG_VERSION"),
    " (",
    ROLLBOOK_DISTRIBUTOR,
    ")"
);

/// The Rollbook API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Base endpoint of the server.
    endpoint: Url,

    /// An initialized HTTP client.
    client: HttpClient,
}

/// An API error.
#[derive(Debug, Display)]
pub enum ApiError {
    /// {0}
    Structured(String),

    /// HTTP {0}: {1}
    Unstructured(StatusCode, String),
}

impl ApiClient {
    pub fn from_server_config(config: &ServerConfig) -> Result<Self> {
        let client = build_http_client()?;

        // Without the trailing slash, joining would replace the last segment.
        let mut endpoint = Url::parse(&config.endpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self { endpoint, client })
    }

    /// Signs in and returns the user.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<Option<User>> {
        let res: AuthResponse = self
            .send_json(Method::POST, "api/auth/signin", request)
            .await?;
        Ok(res.user)
    }

    /// Creates an account and returns the user.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<Option<User>> {
        let res: AuthResponse = self
            .send_json(Method::POST, "api/auth/signup", request)
            .await?;
        Ok(res.user)
    }

    /// Lists students.
    pub async fn list_students(&self, query: &StudentQuery) -> Result<Vec<Student>> {
        let listing: Listing<Student> = self.get_json("api/students", query).await?;
        Ok(listing.into_vec())
    }

    /// Returns the student record linked to a user profile.
    pub async fn find_student_by_profile(&self, profile_id: &RecordId) -> Result<Option<Student>> {
        let query = StudentQuery {
            profile_id: Some(profile_id.clone()),
            ..Default::default()
        };

        let found: OneOrMany<Student> = self.get_json("api/students", &query).await?;
        Ok(found.into_first())
    }

    /// Creates a student.
    pub async fn create_student(&self, request: &StudentRequest) -> Result<()> {
        self.send(Method::POST, "api/students", Some(request)).await
    }

    /// Updates a student.
    pub async fn update_student(&self, id: &RecordId, request: &StudentRequest) -> Result<()> {
        let path = format!("api/students/{}", id);
        self.send(Method::PUT, &path, Some(request)).await
    }

    /// Deletes a student.
    pub async fn delete_student(&self, id: &RecordId) -> Result<()> {
        let path = format!("api/students/{}", id);
        self.send::<()>(Method::DELETE, &path, None).await
    }

    /// Lists attendance records.
    pub async fn list_attendance(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>> {
        let listing: Listing<AttendanceRecord> = self.get_json("api/attendance", query).await?;
        Ok(listing.into_vec())
    }

    /// Replaces the attendance of a day.
    pub async fn save_attendance(&self, request: &SaveAttendanceRequest) -> Result<()> {
        self.send(Method::POST, "api/attendance", Some(request))
            .await
    }

    /// Lists all subjects.
    pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let listing: Listing<Subject> = self.get_json("api/subjects", &()).await?;
        Ok(listing.into_vec())
    }

    /// Creates a subject.
    pub async fn create_subject(&self, request: &CreateSubjectRequest) -> Result<()> {
        self.send(Method::POST, "api/subjects", Some(request)).await
    }

    /// Lists marks.
    pub async fn list_marks(&self, query: &MarksQuery) -> Result<Vec<Mark>> {
        let listing: Listing<Mark> = self.get_json("api/marks", query).await?;
        Ok(listing.into_vec())
    }

    /// Enters a mark.
    pub async fn create_mark(&self, request: &CreateMarkRequest) -> Result<()> {
        self.send(Method::POST, "api/marks", Some(request)).await
    }

    /// Deletes a mark.
    pub async fn delete_mark(&self, id: &RecordId) -> Result<()> {
        let path = format!("api/marks/{}", id);
        self.send::<()>(Method::DELETE, &path, None).await
    }

    /// Returns the overview of a year of study.
    pub async fn get_stats(&self, query: &StatsQuery) -> Result<FacultyStats> {
        self.get_json("api/stats", query).await
    }

    async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::GET, path)?.query(query);
        let res = check_response(req.send().await?).await?;
        Ok(res.json().await?)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(method, path)?.json(body);
        let res = check_response(req.send().await?).await?;
        Ok(res.json().await?)
    }

    /// Sends a request whose response body we don't care about.
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let mut req = self.request(method, path)?;
        if let Some(body) = body {
            req = req.json(body);
        }

        check_response(req.send().await?).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let endpoint = self.endpoint.join(path)?;
        tracing::debug!("{} {}", method, endpoint);

        Ok(self.client.request(method, endpoint))
    }
}

impl StdError for ApiError {}

impl ApiError {
    async fn try_from_response(response: Response) -> Result<Self> {
        let status = response.status();
        let text = response.text().await?;
        Ok(Self::from_body(status, text))
    }

    fn from_body(status: StatusCode, text: String) -> Self {
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(ErrorResponse { error }) => Self::Structured(error),
            Err(_) => Self::Unstructured(status, text),
        }
    }
}

async fn check_response(res: Response) -> Result<Response> {
    if res.status().is_success() {
        Ok(res)
    } else {
        let api_error = ApiError::try_from_response(res).await?;
        Err(api_error.into())
    }
}

fn build_http_client() -> Result<HttpClient> {
    let client = reqwest::Client::builder()
        .user_agent(ROLLBOOK_USER_AGENT)
        .build()?;

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_body() {
        let structured = ApiError::from_body(
            StatusCode::BAD_REQUEST,
            r#"{ "error": "Roll number already exists" }"#.to_string(),
        );
        assert_eq!("Roll number already exists", structured.to_string());
        assert!(matches!(structured, ApiError::Structured(..)));

        let unstructured = ApiError::from_body(
            StatusCode::BAD_GATEWAY,
            "<html>Bad Gateway</html>".to_string(),
        );
        assert!(matches!(unstructured, ApiError::Unstructured(..)));
        assert_eq!(
            "HTTP 502 Bad Gateway: <html>Bad Gateway</html>",
            unstructured.to_string()
        );
    }

    #[test]
    fn test_endpoint_join() {
        for endpoint in ["https://sms.college.edu", "https://sms.college.edu/"] {
            let api = ApiClient::from_server_config(&ServerConfig {
                endpoint: endpoint.to_string(),
            })
            .unwrap();
            assert_eq!(
                "https://sms.college.edu/api/students",
                api.endpoint.join("api/students").unwrap().as_str()
            );
        }

        let nested = ApiClient::from_server_config(&ServerConfig {
            endpoint: "https://college.edu/sms".to_string(),
        })
        .unwrap();
        assert_eq!(
            "https://college.edu/sms/api/marks",
            nested.endpoint.join("api/marks").unwrap().as_str()
        );
    }
}
