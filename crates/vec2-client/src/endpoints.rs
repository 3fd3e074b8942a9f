//! One method per API resource
//!
//! A [`Call`] pairs the client with an HTTP verb. Endpoints that behave
//! differently per verb (`vector`, `like`, `user`, `customer`) read it
//! from the call. Typed mapping of `data` entries only happens when the
//! reply's `status` is true.

use tracing::warn;
use vec2_objects::{Customer, DataField, Payout, Profile, Response, Sale, Tag, User, Vector};
use vec2_transport::{FormData, Method};

use crate::client::Vec2Client;
use crate::dispatcher::Payload;
use crate::error::Result;

/// A single request in the making: client plus verb.
#[derive(Clone)]
pub struct Call<'a> {
    client: &'a Vec2Client,
    method: Method,
}

impl<'a> Call<'a> {
    pub(crate) fn new(client: &'a Vec2Client, method: Method) -> Self {
        Self { client, method }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    async fn send(&self, segments: &[&str], data: FormData, auth: bool) -> Result<Payload> {
        self.client
            .dispatcher
            .dispatch(self.method.clone(), segments, data, auth)
            .await
    }

    async fn call(&self, segments: &[&str], data: FormData, auth: bool) -> Result<Response> {
        let payload = self.send(segments, data, auth).await?;
        Ok(envelope(payload))
    }

    /// Public profile by username.
    pub async fn profile(&self, username: &str) -> Result<Response> {
        let mut resp = self.call(&["profile", username], FormData::new(), false).await?;
        if resp.status {
            resp.map_object::<Profile>("profile", DataField::Profile);
        }
        Ok(resp)
    }

    pub async fn profile_search(&self, query: &str) -> Result<Response> {
        let mut resp = self
            .call(&["profile", "search", query], FormData::new(), false)
            .await?;
        if resp.status {
            resp.map_list::<Profile>("profiles", DataField::Profiles);
        }
        Ok(resp)
    }

    /// Search shared vectors by tag or title.
    pub async fn vector_search(&self, query: &str) -> Result<Response> {
        let mut resp = self
            .call(&["vector", "search", query], FormData::new(), false)
            .await?;
        if resp.status {
            resp.map_list::<Vector>("vectors", DataField::Vectors);
        }
        Ok(resp)
    }

    /// Search the signed-in user's own vectors.
    pub async fn user_vector_search(&self, query: &str) -> Result<Response> {
        let mut resp = self
            .call(&["user", "vector", "search", query], FormData::new(), true)
            .await?;
        if resp.status {
            resp.map_list::<Vector>("vectors", DataField::Vectors);
        }
        Ok(resp)
    }

    /// GET the account, or PATCH it with `data`.
    pub async fn user(&self, data: FormData) -> Result<Response> {
        let mut resp = self.call(&["user"], data, true).await?;
        if resp.status && self.method == Method::GET {
            resp.map_object::<User>("user", DataField::User);
        }
        Ok(resp)
    }

    /// Vectors of `username`, or of the signed-in user when `None`.
    pub async fn vectors(&self, username: Option<&str>) -> Result<Response> {
        let mut resp = match username.filter(|u| !u.is_empty()) {
            Some(username) => {
                self.call(&["profile", username, "vectors"], FormData::new(), false)
                    .await?
            }
            None => self.call(&["user", "vectors"], FormData::new(), true).await?,
        };
        if resp.status {
            resp.map_list::<Vector>("vectors", DataField::Vectors);
        }
        Ok(resp)
    }

    /// GET `vector[/id]`; POST, PATCH and DELETE go to `user/vector[/id]`.
    pub async fn vector(&self, id: Option<&str>, data: FormData) -> Result<Response> {
        let mut segments = if self.method == Method::GET {
            vec!["vector"]
        } else {
            vec!["user", "vector"]
        };
        segments.extend(id);

        let mut resp = self.call(&segments, data, true).await?;
        if resp.status {
            resp.map_object::<Vector>("vector", DataField::Vector);
        }
        Ok(resp)
    }

    /// Download the purchased or owned vector file.
    pub async fn vector_download(&self, id: &str) -> Result<Response> {
        self.file_reply(&["vector", "download", id]).await
    }

    /// Fetch the public preview image of a vector.
    pub async fn vector_public(&self, id: &str) -> Result<Response> {
        self.file_reply(&["vector", "public", id]).await
    }

    /// A JSON reply is an error envelope; any other reply is the file.
    async fn file_reply(&self, segments: &[&str]) -> Result<Response> {
        let resp = match self.send(segments, FormData::new(), true).await? {
            Payload::Json(value) => Response::from_json(&value),
            Payload::Raw(bytes) => {
                let mut resp = Response::new(true);
                resp.insert("vector", DataField::File(bytes));
                resp
            }
            Payload::Tampered => Response::failed(),
        };
        Ok(resp)
    }

    pub async fn tags(&self) -> Result<Response> {
        let mut resp = self.call(&["user", "tags"], FormData::new(), true).await?;
        if resp.status {
            resp.map_list::<Tag>("tags", DataField::Tags);
        }
        Ok(resp)
    }

    /// Add a tag to the user's tag list. Use with POST.
    pub async fn tag(&self, tag: &str) -> Result<Response> {
        self.call(&["user", "tag"], FormData::new().with("tag", tag), true)
            .await
    }

    /// GET card details; POST or PATCH them with `data`.
    pub async fn customer(&self, data: FormData) -> Result<Response> {
        let mut resp = self.call(&["user", "customer"], data, true).await?;
        if resp.status && self.method == Method::GET {
            resp.map_object::<Customer>("customer", DataField::Customer);
        }
        Ok(resp)
    }

    /// Buy a vector. Use with POST.
    pub async fn buy(&self, vector: &str) -> Result<Response> {
        self.call(&["user", "buy"], FormData::new().with("vector", vector), true)
            .await
    }

    pub async fn purchases(&self) -> Result<Response> {
        let mut resp = self
            .call(&["user", "purchases"], FormData::new(), true)
            .await?;
        if resp.status {
            resp.map_list::<Sale>("purchases", DataField::Sales);
        }
        Ok(resp)
    }

    pub async fn sales(&self) -> Result<Response> {
        let mut resp = self.call(&["user", "sales"], FormData::new(), true).await?;
        if resp.status {
            resp.map_list::<Sale>("sales", DataField::Sales);
        }
        Ok(resp)
    }

    pub async fn payouts(&self) -> Result<Response> {
        let mut resp = self.call(&["user", "payouts"], FormData::new(), true).await?;
        if resp.status {
            resp.map_list::<Payout>("payouts", DataField::Payouts);
        }
        Ok(resp)
    }

    /// Request a payout of the current balance. Use with POST.
    pub async fn payout(&self) -> Result<Response> {
        self.call(&["user", "payout"], FormData::new(), true).await
    }

    /// POST likes a vector, DELETE removes the like.
    pub async fn like(&self, vector: &str) -> Result<Response> {
        let mut segments = vec!["user", "like"];
        let mut data = FormData::new();
        if self.method == Method::DELETE {
            segments.push(vector);
        } else if self.method == Method::POST {
            data.insert("vector", vector);
        }
        self.call(&segments, data, true).await
    }
}

/// Turn a dispatched reply into a response envelope. Non-JSON replies and
/// tampered rotations are failed responses.
fn envelope(payload: Payload) -> Response {
    match payload {
        Payload::Json(value) => Response::from_json(&value),
        Payload::Raw(bytes) => {
            warn!(bytes = bytes.len(), "expected a JSON reply");
            Response::failed()
        }
        Payload::Tampered => Response::failed(),
    }
}
