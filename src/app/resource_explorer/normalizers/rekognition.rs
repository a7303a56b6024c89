use super::utils::*;
use super::*;
use crate::app::resource_explorer::state::RekognitionCollection;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListCollectionsOutput {
    #[serde(default)]
    collection_ids: Vec<String>,
    #[serde(default)]
    face_model_versions: Vec<String>,
}

/// Normalizer for Rekognition face collections (`rekognition list-collections`)
pub struct RekognitionCollectionNormalizer;

impl ResourceNormalizer for RekognitionCollectionNormalizer {
    type Record = RekognitionCollection;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Rekognition
    }

    fn operation(&self) -> &'static [&'static str] {
        &["rekognition", "list-collections"]
    }

    fn normalize(
        &self,
        raw: &[u8],
        region: Option<&str>,
    ) -> Result<Vec<RekognitionCollection>, CliError> {
        let output: ListCollectionsOutput =
            serde_json::from_slice(raw).map_err(|e| CliError::parse("list-collections", e))?;

        // Face model versions are a parallel array to the ids
        Ok(output
            .collection_ids
            .into_iter()
            .enumerate()
            .map(|(i, collection_id)| RekognitionCollection {
                collection_id,
                face_model_version: output
                    .face_model_versions
                    .get(i)
                    .cloned()
                    .unwrap_or_default(),
                region: region_label(region),
            })
            .collect())
    }

    fn into_service_resources(
        &self,
        result: AggregateResult<RekognitionCollection>,
    ) -> ServiceResources {
        ServiceResources {
            service: self.kind().key().to_string(),
            rekognition_collections: result.records,
            message: result.message,
            ..Default::default()
        }
    }
}
