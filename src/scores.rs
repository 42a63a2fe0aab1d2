use std::collections::BTreeMap;

use ndarray::Array2;

/// Consolidated scores for one item. Every rater of the owning table has a score.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemScores {
    pub item_id: String,
    pub group_key: Option<String>,
    pub scores: BTreeMap<String, f64>,
    pub justifications: BTreeMap<String, Option<String>>,
    pub contributing_columns: BTreeMap<String, Vec<String>>,
    pub mean: f64,
    pub std_dev: f64,
}

impl ItemScores {
    pub fn new(item_id: String, group_key: Option<String>) -> Self {
        Self {
            item_id,
            group_key,
            scores: BTreeMap::new(),
            justifications: BTreeMap::new(),
            contributing_columns: BTreeMap::new(),
            mean: 0.0,
            std_dev: 0.0,
        }
    }

    /// Recomputes `mean` and the sample `std_dev` across raters.
    pub fn refresh_derived(&mut self) {
        let values = self.scores.values().copied().collect::<Vec<f64>>();
        self.mean = mean(&values).unwrap_or(0.0);
        self.std_dev = sample_std_dev(&values).unwrap_or(0.0);
    }
}

/// Items x raters. Raters and items are kept sorted so every derived view is
/// independent of the order in which sources were supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    raters: Vec<String>,
    items: Vec<ItemScores>,
}

impl ScoreTable {
    pub fn new(mut raters: Vec<String>, mut items: Vec<ItemScores>) -> Self {
        raters.sort();
        raters.dedup();
        items.sort_by(|left, right| left.item_id.cmp(&right.item_id));
        for item in &mut items {
            item.refresh_derived();
        }
        Self { raters, items }
    }

    /// Builds a table from aligned score columns. Items are named `item_000`,
    /// `item_001`, ...
    #[cfg(test)]
    pub fn from_columns<S: AsRef<str>, V: AsRef<[f64]>>(columns: &[(S, V)]) -> Self {
        let item_count = columns
            .first()
            .map(|(_, values)| values.as_ref().len())
            .unwrap_or(0);
        let mut items = Vec::with_capacity(item_count);
        for index in 0..item_count {
            let mut item = ItemScores::new(format!("item_{index:03}"), None);
            for (rater, values) in columns {
                item.scores
                    .insert(rater.as_ref().to_string(), values.as_ref()[index]);
            }
            items.push(item);
        }
        let raters = columns
            .iter()
            .map(|(rater, _)| rater.as_ref().to_string())
            .collect();
        Self::new(raters, items)
    }

    pub fn raters(&self) -> &[String] {
        &self.raters
    }

    pub fn items(&self) -> &[ItemScores] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn rater_count(&self) -> usize {
        self.raters.len()
    }

    /// One rater's scores in item order.
    pub fn column(&self, rater: &str) -> Vec<f64> {
        self.items
            .iter()
            .map(|item| item.scores.get(rater).copied().unwrap_or(f64::NAN))
            .collect()
    }

    pub fn mean_column(&self) -> Vec<f64> {
        self.items.iter().map(|item| item.mean).collect()
    }

    pub fn std_dev_column(&self) -> Vec<f64> {
        self.items.iter().map(|item| item.std_dev).collect()
    }

    /// N x k matrix, rows follow `items()`, columns follow `raters()`.
    pub fn matrix(&self) -> Array2<f64> {
        let (n, k) = (self.items.len(), self.raters.len());
        Array2::from_shape_fn((n, k), |(row, col)| {
            self.items[row]
                .scores
                .get(&self.raters[col])
                .copied()
                .unwrap_or(f64::NAN)
        })
    }

    /// Items ordered by descending cross-rater spread; ties fall back to item id.
    pub fn most_disagreement(&self, limit: usize) -> Vec<&ItemScores> {
        let mut ranked = self.items.iter().collect::<Vec<&ItemScores>>();
        ranked.sort_by(|left, right| {
            right
                .std_dev
                .total_cmp(&left.std_dev)
                .then_with(|| left.item_id.cmp(&right.item_id))
        });
        ranked.truncate(limit);
        ranked
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator); undefined below two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let squares = values.iter().map(|value| (value - mu).powi(2)).sum::<f64>();
    Some(squares / (values.len() - 1) as f64)
}

pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}
