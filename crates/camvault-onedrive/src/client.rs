//! Picture operations against the OneDrive item-by-path API
//!
//! All paths live under the drive's `Pictures` folder:
//!
//! | Operation | Request | Success |
//! |---|---|---|
//! | upload | `PUT {api}/Pictures/{root}/{name}:/content` | 201 |
//! | list | `GET {api}/Pictures/{folder}:/children` | 200 |
//! | delete | `DELETE {api}/Pictures/{folder}/{name}` | 204 |
//!
//! Every call runs inside the given [`TransportSession`] and resolves to
//! [`OneDriveError::Canceled`] if that session is replaced mid-flight.

use camvault_core::{
    config::OneDriveConfig,
    domain::{RemoteFolderPath, RemotePictureName},
};
use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::{
    listing::{parser_for, ChildrenParser},
    session::TransportSession,
    OneDriveError, Result,
};

/// Name of the drive folder every archive lives under
const PICTURES_FOLDER: &str = "Pictures";

/// Stateless client for picture uploads, listings and deletions
pub struct OneDriveClient {
    api_base_url: String,
    root_folder: String,
    parser: Box<dyn ChildrenParser>,
}

impl OneDriveClient {
    pub fn new(
        api_base_url: impl Into<String>,
        root_folder: impl Into<String>,
        parser: Box<dyn ChildrenParser>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            root_folder: root_folder.into(),
            parser,
        }
    }

    /// Creates a client from the `onedrive` configuration section
    pub fn from_config(config: &OneDriveConfig) -> Self {
        Self::new(
            config.api_base_url.clone(),
            config.root_folder.clone(),
            parser_for(config.listing_parser),
        )
    }

    pub fn root_folder(&self) -> &str {
        &self.root_folder
    }

    fn pictures_url(&self, relative: &str) -> String {
        format!("{}/{}/{}", self.api_base_url, PICTURES_FOLDER, relative)
    }

    /// Uploads `body` as `{root}/{name}`
    ///
    /// # Errors
    /// [`OneDriveError::Upload`] unless the provider answers 201 Created.
    pub async fn upload_picture(
        &self,
        session: &TransportSession,
        name: &RemotePictureName,
        body: Vec<u8>,
    ) -> Result<()> {
        let url = self.pictures_url(&format!("{}/{}:/content", self.root_folder, name));
        debug!(remote_name = %name, bytes = body.len(), "Uploading picture");

        let status = session
            .run(async {
                let response = session
                    .request(Method::PUT, &url)
                    .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
                    .body(body)
                    .send()
                    .await?;
                Ok::<_, OneDriveError>(response.status())
            })
            .await?;

        if status == StatusCode::CREATED {
            Ok(())
        } else {
            Err(OneDriveError::Upload {
                name: name.to_string(),
                status: status.as_u16(),
            })
        }
    }

    /// Lists the picture names directly inside `folder`
    ///
    /// A folder that does not exist (404) is reported as empty: nothing was
    /// ever uploaded into that bucket, so there is nothing to expire.
    ///
    /// # Errors
    /// [`OneDriveError::Listing`] for any other non-200 status, or a
    /// transport/cancellation error.
    pub async fn list_pictures(
        &self,
        session: &TransportSession,
        folder: &RemoteFolderPath,
    ) -> Result<Vec<String>> {
        let url = self.pictures_url(&format!("{}:/children", folder));
        debug!(folder = %folder, "Listing remote folder");

        let (status, body) = session
            .run(async {
                let response = session.request(Method::GET, &url).send().await?;
                let status = response.status();
                let body = response.text().await?;
                Ok::<_, OneDriveError>((status, body))
            })
            .await?;

        match status {
            StatusCode::OK => Ok(self.parser.parse(&body)),
            StatusCode::NOT_FOUND => {
                debug!(folder = %folder, "Remote folder does not exist");
                Ok(Vec::new())
            }
            other => Err(OneDriveError::Listing {
                folder: folder.to_string(),
                status: other.as_u16(),
            }),
        }
    }

    /// Deletes `{folder}/{name}`
    ///
    /// # Errors
    /// [`OneDriveError::Delete`] unless the provider answers 204 No Content.
    pub async fn delete_picture(
        &self,
        session: &TransportSession,
        folder: &RemoteFolderPath,
        name: &str,
    ) -> Result<()> {
        let url = self.pictures_url(&format!("{}/{}", folder, name));
        debug!(folder = %folder, name, "Deleting remote picture");

        let status = session
            .run(async {
                let response = session.request(Method::DELETE, &url).send().await?;
                Ok::<_, OneDriveError>(response.status())
            })
            .await?;

        if status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(OneDriveError::Delete {
                name: format!("{}/{}", folder, name),
                status: status.as_u16(),
            })
        }
    }
}
