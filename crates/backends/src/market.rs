//! Market price prediction

use crate::{Backend, BackendError, PredictionOutput};
use artifact_store::{names, ArtifactStore};
use data_validator::{FieldSpec, ValidatedInput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Categorical fields arrive already numerically encoded
const FIELDS: &[FieldSpec] = &[
    FieldSpec::numeric("crop_type"),
    FieldSpec::numeric("month"),
    FieldSpec::numeric("region_index"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPrice {
    pub predicted_price: f64,
}

pub struct MarketBackend {
    store: Arc<ArtifactStore>,
}

impl MarketBackend {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

impl Backend for MarketBackend {
    fn name(&self) -> &'static str {
        "market"
    }

    fn schema(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn predict(&self, input: &ValidatedInput) -> Result<PredictionOutput, BackendError> {
        let regressor = self.store.regressor(names::MARKET_MODEL)?;
        let price = regressor.predict(&input.features())?;
        if !price.is_finite() {
            return Err(BackendError::Inference(format!(
                "regressor produced non-finite price {}",
                price
            )));
        }
        Ok(PredictionOutput::Market(MarketPrice {
            predicted_price: price,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{store, FailingRegressor, FixedRegressor};
    use artifact_store::Artifact;

    fn scenario() -> ValidatedInput {
        ValidatedInput {
            numbers: vec![3.0, 6.0, 2.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_predicts_price() {
        let backend = MarketBackend::new(store(vec![(
            names::MARKET_MODEL,
            Artifact::Regressor(Arc::new(FixedRegressor(2150.5))),
        )]));
        assert_eq!(
            backend.predict(&scenario()).unwrap(),
            PredictionOutput::Market(MarketPrice {
                predicted_price: 2150.5
            })
        );
    }

    #[test]
    fn test_non_finite_price() {
        let backend = MarketBackend::new(store(vec![(
            names::MARKET_MODEL,
            Artifact::Regressor(Arc::new(FixedRegressor(f64::INFINITY))),
        )]));
        assert!(matches!(backend.predict(&scenario()), Err(BackendError::Inference(_))));
    }

    #[test]
    fn test_inference_error_surfaces_message() {
        let backend = MarketBackend::new(store(vec![(
            names::MARKET_MODEL,
            Artifact::Regressor(Arc::new(FailingRegressor)),
        )]));
        let err = backend.predict(&scenario()).unwrap_err();
        assert!(err.to_string().contains("graph exploded"));
    }
}
