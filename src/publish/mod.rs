mod uri;

use log::{debug, info};

pub use uri::{ImageUri, UnrecognizedImageUri};

use crate::api::{ApiError, PublishApi};
use crate::builders::{BuilderConfig, PublishImage, PublishRequest};
use crate::cloud::{Image, ImageState, PublishedImage, Source};

/// API handle plus the login the nested resource paths are addressed with.
pub struct ImageContext<A> {
    api: A,
    login: String,
}

impl<A: PublishApi> ImageContext<A> {
    pub fn new(api: A, login: impl Into<String>) -> Self {
        Self {
            api,
            login: login.into(),
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }
}

/// An image can be published once generation is complete, it was not
/// cancelled, and its install profile sizes memory and swap.
pub fn is_image_ready_to_publish(image: &Image, builder: &BuilderConfig) -> bool {
    let status = image.status();
    let sized = image
        .install_profile()
        .is_some_and(|p| p.memory_size().is_some() && p.swap_size().is_some());

    let ready = status.is_complete() && status.state() != ImageState::Cancelled && sized;

    debug!(
        "image {} for {} builder: state={} complete={} sized={sized} -> ready={ready}",
        image.db_id(),
        builder.type_name().unwrap_or("untyped"),
        status.state(),
        status.is_complete(),
    );

    ready
}

/// Fetch an image record. The path is addressed with the context login, as
/// the publish call is.
pub async fn fetch_image<A: PublishApi>(context: &ImageContext<A>, uri: &ImageUri) -> Result<Image, PublishError> {
    let uri = uri.for_login(&context.login);
    Ok(context.api.get_image(&uri.to_string()).await?)
}

/// Resolve the appliance or scan an image was generated from, under the
/// context login.
pub async fn fetch_source<A: PublishApi>(context: &ImageContext<A>, uri: &ImageUri) -> Result<Source, PublishError> {
    let parent = uri.for_login(&context.login).parent_uri();
    let source = match uri {
        ImageUri::Appliance { .. } => Source::Appliance(context.api.get_appliance(&parent).await?),
        ImageUri::Scan { .. } => Source::Scan(context.api.get_scan(&parent).await?),
    };
    Ok(source)
}

/// Send `request` to the publish endpoint matching the image's origin.
pub async fn call_publish_webservice<A: PublishApi>(
    context: &ImageContext<A>,
    image: &Image,
    source: &Source,
    request: PublishRequest,
) -> Result<PublishedImage, PublishError> {
    let uri: ImageUri = image.uri().parse()?;
    let provider = request.kind();
    let body = PublishImage::new(request, image.uri(), source.uri());

    let published = match (source, &uri) {
        (
            Source::Scan(_),
            ImageUri::Scan {
                scanned_instance_id,
                scan_id,
                image_id,
                ..
            },
        ) => {
            context
                .api
                .publish_scan_image(&context.login, *scanned_instance_id, *scan_id, *image_id, &body)
                .await?
        }
        (
            Source::Appliance(_),
            ImageUri::Appliance {
                appliance_id, image_id, ..
            },
        ) => {
            context
                .api
                .publish_appliance_image(&context.login, *appliance_id, *image_id, &body)
                .await?
        }
        _ => {
            return Err(PublishError::SourceMismatch {
                kind: source.kind(),
                uri: image.uri().to_string(),
            });
        }
    };

    info!("published image {} to {provider} as {}", image.db_id(), published.uri());
    Ok(published)
}

/// ---- Errors ----
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    UnrecognizedImageUri(#[from] UnrecognizedImageUri),
    #[error("image '{uri}' does not belong to a {kind}")]
    SourceMismatch { kind: &'static str, uri: String },
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{PublishAws, PublishOutscale};
    use crate::cloud::{Appliance, ImageStatus, InstallProfile, Scan};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    const APP_URI: &str = "users/guest/appliances/5/images/1234/";
    const SCAN_URI: &str = "users/guest/scannedinstances/5/scans/12/images/1234";
    const PUBLISHED_APP_URI: &str = "users/guest/appliances/5/images/1234/pimages/5678";
    const PUBLISHED_SCAN_URI: &str = "users/guest/scannedinstances/5/scans/12/images/1234/pimages/5678";

    /// Records every call and answers with canned records.
    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<String>>,
        bodies: Mutex<Vec<PublishImage>>,
        fail_publish: bool,
    }

    impl RecordingApi {
        fn failing() -> Self {
            Self {
                fail_publish: true,
                ..Default::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn reply(&self, uri: &str, body: &PublishImage) -> Result<PublishedImage, ApiError> {
            self.bodies.lock().unwrap().push(body.clone());
            if self.fail_publish {
                return Err(ApiError::Status {
                    status: StatusCode::FORBIDDEN,
                    url: uri.to_string(),
                    body: "denied".to_string(),
                });
            }
            Ok(PublishedImage::new(5678, uri))
        }
    }

    #[async_trait]
    impl PublishApi for RecordingApi {
        async fn get_image(&self, uri: &str) -> Result<Image, ApiError> {
            self.record(format!("get_image {uri}"));
            Ok(build_image_to_publish(ImageState::Complete, true, uri))
        }

        async fn get_appliance(&self, uri: &str) -> Result<Appliance, ApiError> {
            self.record(format!("get_appliance {uri}"));
            Ok(Appliance::new(5, uri))
        }

        async fn get_scan(&self, uri: &str) -> Result<Scan, ApiError> {
            self.record(format!("get_scan {uri}"));
            Ok(Scan::new(12, uri))
        }

        async fn publish_appliance_image(
            &self,
            login: &str,
            appliance_id: u64,
            image_id: u64,
            body: &PublishImage,
        ) -> Result<PublishedImage, ApiError> {
            self.record(format!("publish_appliance_image {login} {appliance_id} {image_id}"));
            self.reply(PUBLISHED_APP_URI, body)
        }

        async fn publish_scan_image(
            &self,
            login: &str,
            scanned_instance_id: u64,
            scan_id: u64,
            image_id: u64,
            body: &PublishImage,
        ) -> Result<PublishedImage, ApiError> {
            self.record(format!(
                "publish_scan_image {login} {scanned_instance_id} {scan_id} {image_id}"
            ));
            self.reply(PUBLISHED_SCAN_URI, body)
        }
    }

    fn build_image_to_publish(state: ImageState, complete: bool, uri: &str) -> Image {
        Image::new(1234, uri, ImageStatus::new(state, complete))
            .with_install_profile(InstallProfile::new(Some(1024), Some(1024)))
    }

    fn build_builder() -> BuilderConfig {
        [("type", "aws"), ("region", "eu-west-1"), ("bucket", "images")]
            .into_iter()
            .collect()
    }

    fn aws_request() -> PublishRequest {
        PublishRequest::Aws(PublishAws {
            region: "eu-west-1".to_string(),
            bucket: "images".to_string(),
        })
    }

    #[test]
    fn ready_when_complete_and_sized() {
        let image = build_image_to_publish(ImageState::Complete, true, APP_URI);
        assert!(is_image_ready_to_publish(&image, &build_builder()));
    }

    #[test]
    fn not_ready_when_cancelled() {
        let image = build_image_to_publish(ImageState::Cancelled, false, APP_URI);
        assert!(!is_image_ready_to_publish(&image, &build_builder()));
    }

    #[test]
    fn not_ready_when_cancelled_even_if_flagged_complete() {
        let image = build_image_to_publish(ImageState::Cancelled, true, APP_URI);
        assert!(!is_image_ready_to_publish(&image, &build_builder()));
    }

    #[test]
    fn not_ready_while_building() {
        let image = build_image_to_publish(ImageState::Building, false, APP_URI);
        assert!(!is_image_ready_to_publish(&image, &build_builder()));
    }

    #[test]
    fn not_ready_without_memory_or_swap() {
        let status = || ImageStatus::new(ImageState::Complete, true);
        let no_swap = Image::new(1, APP_URI, status()).with_install_profile(InstallProfile::new(Some(1024), None));
        let no_memory = Image::new(1, APP_URI, status()).with_install_profile(InstallProfile::new(None, Some(512)));
        let no_profile = Image::new(1, APP_URI, status());

        for image in [no_swap, no_memory, no_profile] {
            assert!(!is_image_ready_to_publish(&image, &build_builder()));
        }
    }

    #[tokio::test]
    async fn publishes_scan_image_through_scan_endpoint() {
        let context = ImageContext::new(RecordingApi::default(), "guest");
        let image = build_image_to_publish(ImageState::Complete, true, SCAN_URI);
        let source = Source::Scan(Scan::new(12, "users/guest/scannedinstances/5/scans/12"));

        let published = call_publish_webservice(&context, &image, &source, aws_request())
            .await
            .unwrap();

        assert_eq!(published, PublishedImage::new(5678, PUBLISHED_SCAN_URI));
        assert_eq!(context.api().calls(), vec!["publish_scan_image guest 5 12 1234"]);
    }

    #[tokio::test]
    async fn publishes_template_image_through_appliance_endpoint() {
        let context = ImageContext::new(RecordingApi::default(), "guest");
        let image = build_image_to_publish(ImageState::Complete, true, APP_URI);
        let source = Source::Appliance(Appliance::new(5, "users/guest/appliances/5"));

        let published = call_publish_webservice(&context, &image, &source, aws_request())
            .await
            .unwrap();

        assert_eq!(published, PublishedImage::new(5678, PUBLISHED_APP_URI));
        assert_eq!(context.api().calls(), vec!["publish_appliance_image guest 5 1234"]);
    }

    #[tokio::test]
    async fn payload_carries_image_and_parent_uris() {
        let context = ImageContext::new(RecordingApi::default(), "guest");
        let image = build_image_to_publish(ImageState::Complete, true, APP_URI);
        let source = Source::Appliance(Appliance::new(5, "users/guest/appliances/5"));
        let request = PublishRequest::Outscale(PublishOutscale {
            region: "eu-west-2".to_string(),
        });

        call_publish_webservice(&context, &image, &source, request.clone())
            .await
            .unwrap();

        let bodies = context.api().bodies.lock().unwrap().clone();
        assert_eq!(
            bodies,
            vec![PublishImage::new(request, APP_URI, "users/guest/appliances/5")]
        );
    }

    #[tokio::test]
    async fn wrong_image_uri_is_an_error() {
        let context = ImageContext::new(RecordingApi::default(), "guest");
        let image = build_image_to_publish(ImageState::Complete, true, "wrong/uri/");
        let source = Source::Appliance(Appliance::new(5, APP_URI));

        let result = call_publish_webservice(&context, &image, &source, aws_request()).await;

        assert!(matches!(result, Err(PublishError::UnrecognizedImageUri(_))));
        assert!(context.api().calls().is_empty());
    }

    #[tokio::test]
    async fn source_kind_must_match_uri_shape() {
        let context = ImageContext::new(RecordingApi::default(), "guest");
        let image = build_image_to_publish(ImageState::Complete, true, SCAN_URI);
        let source = Source::Appliance(Appliance::new(5, "users/guest/appliances/5"));

        let result = call_publish_webservice(&context, &image, &source, aws_request()).await;

        assert!(matches!(
            result,
            Err(PublishError::SourceMismatch { kind: "appliance", .. })
        ));
        assert!(context.api().calls().is_empty());
    }

    #[tokio::test]
    async fn remote_errors_propagate() {
        let context = ImageContext::new(RecordingApi::failing(), "guest");
        let image = build_image_to_publish(ImageState::Complete, true, APP_URI);
        let source = Source::Appliance(Appliance::new(5, "users/guest/appliances/5"));

        let result = call_publish_webservice(&context, &image, &source, aws_request()).await;

        assert!(matches!(
            result,
            Err(PublishError::Api(ApiError::Status { status, .. })) if status == StatusCode::FORBIDDEN
        ));
    }

    #[tokio::test]
    async fn fetch_source_follows_uri_shape() {
        let context = ImageContext::new(RecordingApi::default(), "guest");

        let scan = fetch_source(&context, &SCAN_URI.parse().unwrap()).await.unwrap();
        let appliance = fetch_source(&context, &APP_URI.parse().unwrap()).await.unwrap();

        assert!(matches!(scan, Source::Scan(_)));
        assert!(matches!(appliance, Source::Appliance(_)));
        assert_eq!(
            context.api().calls(),
            vec![
                "get_scan users/guest/scannedinstances/5/scans/12",
                "get_appliance users/guest/appliances/5",
            ]
        );
    }

    #[tokio::test]
    async fn every_call_uses_the_context_login() {
        let context = ImageContext::new(RecordingApi::default(), "guest");
        let uri: ImageUri = "users/other/appliances/5/images/1234".parse().unwrap();

        let image = fetch_image(&context, &uri).await.unwrap();
        let source = fetch_source(&context, &uri).await.unwrap();
        call_publish_webservice(&context, &image, &source, aws_request())
            .await
            .unwrap();

        assert_eq!(
            context.api().calls(),
            vec![
                "get_image users/guest/appliances/5/images/1234",
                "get_appliance users/guest/appliances/5",
                "publish_appliance_image guest 5 1234",
            ]
        );
    }
}
