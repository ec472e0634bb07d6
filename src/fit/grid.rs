//! Hyperparameter grids and the production configuration.
//!
//! Grid points are enumerated like a cartesian product over parameter names in
//! alphabetical order, last name varying fastest. Grid position breaks ties in
//! model selection, so this order is part of the search's behaviour.

use crate::domain::ModelFamily;
use crate::models::{
    BoostingParams, ForestParams, KnnParams, LassoParams, LinearParams, MaxFeatures,
    ModelParams, ObliviousParams,
};

/// One row of the search catalog: a family and every grid point to try.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub family: ModelFamily,
    pub grid: Vec<ModelParams>,
}

/// The grid searched for one family.
pub fn family_grid(family: ModelFamily) -> Vec<ModelParams> {
    match family {
        ModelFamily::Linear => [true, false]
            .into_iter()
            .map(|fit_intercept| ModelParams::Linear(LinearParams { fit_intercept }))
            .collect(),
        ModelFamily::Lasso => [0.1, 1.0, 10.0]
            .into_iter()
            .map(|alpha| {
                ModelParams::Lasso(LassoParams {
                    alpha,
                    ..LassoParams::default()
                })
            })
            .collect(),
        ModelFamily::Knn => [3, 5, 7]
            .into_iter()
            .map(|n_neighbors| ModelParams::Knn(KnnParams { n_neighbors }))
            .collect(),
        ModelFamily::RandomForest => {
            let mut out = Vec::new();
            for max_depth in [None, Some(5), Some(10)] {
                for max_features in [
                    MaxFeatures::All,
                    MaxFeatures::Count(5),
                    MaxFeatures::Count(7),
                    MaxFeatures::Count(8),
                ] {
                    for n_estimators in [50, 100] {
                        out.push(ModelParams::RandomForest(ForestParams {
                            n_estimators,
                            max_depth,
                            max_features,
                        }));
                    }
                }
            }
            out
        }
        ModelFamily::Xgboost => {
            let mut out = Vec::new();
            for learning_rate in [0.01, 0.1, 0.3] {
                for n_estimators in [50, 100] {
                    out.push(ModelParams::Xgboost(BoostingParams {
                        n_estimators,
                        learning_rate,
                        ..BoostingParams::default()
                    }));
                }
            }
            out
        }
        ModelFamily::Catboost => {
            let mut out = Vec::new();
            for depth in [6, 8] {
                for iterations in [100, 200] {
                    for learning_rate in [0.01, 0.1] {
                        out.push(ModelParams::Catboost(ObliviousParams {
                            depth,
                            learning_rate,
                            iterations,
                            ..ObliviousParams::default()
                        }));
                    }
                }
            }
            out
        }
    }
}

/// Catalog entries for the requested families, in canonical family order.
pub fn catalog(families: &[ModelFamily]) -> Vec<CatalogEntry> {
    ModelFamily::ALL
        .into_iter()
        .filter(|f| families.contains(f))
        .map(|family| CatalogEntry {
            family,
            grid: family_grid(family),
        })
        .collect()
}

/// Configuration persisted for serving, independent of which grid point won.
pub fn production_params() -> ModelParams {
    ModelParams::Xgboost(BoostingParams {
        n_estimators: 100,
        learning_rate: 0.3,
        ..BoostingParams::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_sizes_match_the_catalog() {
        let sizes: Vec<usize> = ModelFamily::ALL
            .into_iter()
            .map(|f| family_grid(f).len())
            .collect();
        assert_eq!(sizes, vec![2, 3, 3, 24, 6, 8]);
    }

    #[test]
    fn grid_points_belong_to_their_family() {
        for family in ModelFamily::ALL {
            assert!(family_grid(family).iter().all(|p| p.family() == family));
        }
    }

    #[test]
    fn catalog_filters_but_keeps_canonical_order() {
        let entries = catalog(&[ModelFamily::Catboost, ModelFamily::Linear]);
        let families: Vec<_> = entries.iter().map(|e| e.family).collect();
        assert_eq!(families, vec![ModelFamily::Linear, ModelFamily::Catboost]);
    }

    #[test]
    fn production_is_depth_six_boosting() {
        match production_params() {
            ModelParams::Xgboost(p) => {
                assert_eq!(p.n_estimators, 100);
                assert_eq!(p.learning_rate, 0.3);
                assert_eq!(p.max_depth, 6);
            }
            other => panic!("unexpected production params {other}"),
        }
    }
}
