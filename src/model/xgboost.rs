//! Native evaluation of XGBoost `gbtree` models saved as JSON
//! (`booster.save_model("model.json")`).

use serde::Deserialize;
use std::{fs, path::Path};

use super::{check_len, Predictor};
use crate::error::ModelError;

#[derive(Deserialize)]
struct ModelJson {
    learner: LearnerJson,
}

#[derive(Deserialize)]
struct LearnerJson {
    #[serde(default)]
    attributes: AttributesJson,
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: BoosterJson,
    learner_model_param: LearnerParamJson,
    objective: ObjectiveJson,
}

// Written by early stopping; `predict` only uses trees up to this round.
#[derive(Deserialize, Default)]
struct AttributesJson {
    best_iteration: Option<String>,
}

#[derive(Deserialize)]
struct BoosterJson {
    name: String,
    model: Option<GbtreeJson>,
}

#[derive(Deserialize)]
struct GbtreeJson {
    #[serde(default)]
    gbtree_model_param: Option<GbtreeParamJson>,
    trees: Vec<TreeJson>,
}

#[derive(Deserialize)]
struct GbtreeParamJson {
    #[serde(default)]
    num_parallel_tree: Option<String>,
}

#[derive(Deserialize)]
struct TreeJson {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
}

// Older writers emit 0/1, newer ones booleans.
#[derive(Deserialize, Clone, Copy)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(n) => n != 0,
        }
    }
}

#[derive(Deserialize)]
struct LearnerParamJson {
    base_score: String,
    #[serde(default)]
    num_feature: Option<String>,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_target: Option<String>,
}

#[derive(Deserialize)]
struct ObjectiveJson {
    name: String,
}

/// How the summed margin maps back to a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Identity,
    Log,
}

impl Link {
    fn for_objective(name: &str) -> Result<Self, ModelError> {
        match name {
            "reg:squarederror" | "reg:squaredlogerror" | "reg:absoluteerror"
            | "reg:pseudohubererror" | "reg:quantileerror" | "reg:linear" => Ok(Link::Identity),
            "reg:gamma" | "reg:tweedie" | "count:poisson" => Ok(Link::Log),
            other => Err(ModelError::Unsupported(format!("objective {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f32,
    default_left: bool,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left < 0
    }
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_json(t: TreeJson, n: usize) -> Result<Self, ModelError> {
        let len = t.left_children.len();
        if len == 0 {
            return Err(ModelError::Malformed(format!("tree {} has no nodes", n)));
        }
        if t.right_children.len() != len
            || t.split_indices.len() != len
            || t.split_conditions.len() != len
            || t.default_left.len() != len
        {
            return Err(ModelError::Malformed(format!(
                "tree {} has node arrays of different lengths",
                n
            )));
        }
        if t.split_type.iter().any(|&s| s != 0) {
            return Err(ModelError::Unsupported(format!(
                "tree {} uses categorical splits",
                n
            )));
        }

        let mut nodes = Vec::with_capacity(len);
        for i in 0..len {
            let (left, right) = (t.left_children[i], t.right_children[i]);
            let in_range = |c: i32| c >= 0 && (c as usize) < len;
            if left >= 0 && !(in_range(left) && in_range(right)) {
                return Err(ModelError::Malformed(format!(
                    "tree {} node {} points outside the tree",
                    n, i
                )));
            }
            let feature = usize::try_from(t.split_indices[i]).map_err(|_| {
                ModelError::Malformed(format!("tree {} node {} has a negative split index", n, i))
            })?;
            nodes.push(Node {
                left,
                right,
                feature,
                threshold: t.split_conditions[i],
                default_left: t.default_left[i].is_set(),
            });
        }
        Ok(Self { nodes })
    }

    fn leaf_value(&self, x: &[f32]) -> Result<f32, ModelError> {
        let mut i = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            let node = &self.nodes[i];
            if node.is_leaf() {
                return Ok(node.threshold);
            }
            let fvalue = *x.get(node.feature).ok_or_else(|| {
                ModelError::Malformed(format!("split on feature {} beyond input", node.feature))
            })?;
            let go_left = if fvalue.is_nan() {
                node.default_left
            } else {
                fvalue < node.threshold
            };
            let next = if go_left { node.left } else { node.right };
            i = next as usize;
        }
        Err(ModelError::Malformed("tree traversal did not reach a leaf".into()))
    }
}

/// A gradient-boosted tree ensemble for single-target regression.
#[derive(Debug, Clone)]
pub struct XgbModel {
    trees: Vec<Tree>,
    base_margin: f32,
    link: Link,
    num_feature: Option<usize>,
    feature_names: Vec<String>,
    objective: String,
}

impl XgbModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self, ModelError> {
        let doc: ModelJson = serde_json::from_str(txt)?;
        let learner = doc.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelError::Unsupported(format!(
                "booster {}",
                learner.gradient_booster.name
            )));
        }
        let params = &learner.learner_model_param;
        if count_param(params.num_class.as_deref())? > 0 {
            return Err(ModelError::Unsupported("multi-class models".into()));
        }
        if count_param(params.num_target.as_deref())? > 1 {
            return Err(ModelError::Unsupported("multi-target models".into()));
        }

        let link = Link::for_objective(&learner.objective.name)?;
        let base_score = parse_base_score(&params.base_score)?;
        let base_margin = match link {
            Link::Identity => base_score,
            Link::Log => base_score.ln(),
        };
        let num_feature = match params.num_feature.as_deref() {
            Some(s) => Some(count_param(Some(s))?),
            None => None,
        };

        let gbtree = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelError::Malformed("gbtree booster without model".into()))?;
        let per_round = gbtree
            .gbtree_model_param
            .as_ref()
            .map(|p| count_param(p.num_parallel_tree.as_deref()))
            .transpose()?
            .unwrap_or(1)
            .max(1);
        let mut trees = gbtree
            .trees
            .into_iter()
            .enumerate()
            .map(|(n, t)| Tree::from_json(t, n))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(best) = learner.attributes.best_iteration.as_deref() {
            let rounds = count_param(Some(best))? + 1;
            let keep = rounds.saturating_mul(per_round);
            if keep < trees.len() {
                tracing::debug!(
                    "best_iteration={}; using {} of {} trees",
                    best,
                    keep,
                    trees.len()
                );
                trees.truncate(keep);
            }
        }

        if let Some(dim) = num_feature {
            let widest = trees
                .iter()
                .flat_map(|t| t.nodes.iter())
                .filter(|n| !n.is_leaf())
                .map(|n| n.feature)
                .max();
            if let Some(f) = widest {
                if f >= dim {
                    return Err(ModelError::Malformed(format!(
                        "split on feature {} but model declares {} features",
                        f, dim
                    )));
                }
            }
        }

        tracing::debug!(
            "xgboost model: {} trees, objective={}, base_score={}",
            trees.len(),
            learner.objective.name,
            base_score
        );

        Ok(Self {
            trees,
            base_margin,
            link,
            num_feature,
            feature_names: learner.feature_names,
            objective: learner.objective.name,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    fn margin(&self, x: &[f32]) -> Result<f32, ModelError> {
        let mut sum = self.base_margin;
        for tree in &self.trees {
            sum += tree.leaf_value(x)?;
        }
        Ok(sum)
    }
}

impl Predictor for XgbModel {
    fn predict(&self, x: &[f32]) -> Result<f32, ModelError> {
        if let Some(dim) = self.num_feature {
            check_len(x, dim)?;
        }
        let margin = self.margin(x)?;
        Ok(match self.link {
            Link::Identity => margin,
            Link::Log => margin.exp(),
        })
    }

    fn input_dim(&self) -> Option<usize> {
        self.num_feature
    }

    fn feature_names(&self) -> Option<&[String]> {
        if self.feature_names.is_empty() {
            None
        } else {
            Some(&self.feature_names)
        }
    }

    fn describe(&self) -> String {
        format!("xgboost gbtree ({} trees, {})", self.trees.len(), self.objective)
    }
}

// XGBoost writes `"5E-1"`, newer releases `"[5E-1]"`.
fn parse_base_score(raw: &str) -> Result<f32, ModelError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']').trim();
    trimmed
        .parse::<f32>()
        .map_err(|_| ModelError::Malformed(format!("base_score {:?}", raw)))
}

fn count_param(raw: Option<&str>) -> Result<usize, ModelError> {
    match raw {
        None => Ok(0),
        Some(s) => s
            .trim()
            .parse::<usize>()
            .map_err(|_| ModelError::Malformed(format!("expected a count, got {:?}", s))),
    }
}
