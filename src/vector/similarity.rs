// ABOUTME: Cosine distance and brute-force nearest-document ranking
// ABOUTME: Lower distance is closer; ties keep insertion order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::VectorDocument;

/// Cosine distance: `1.0 - cosine_similarity(a, b)`
///
/// Returns 0.0 for identical directions and 2.0 for opposite ones. Zero
/// vectors and mismatched dimensions count as orthogonal (1.0).
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0_f32, 0.0_f32, 0.0_f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denom = (norm_a * norm_b).sqrt();
    if denom < f32::EPSILON {
        return 1.0;
    }
    1.0 - (dot / denom).clamp(-1.0, 1.0)
}

/// The `k` documents closest to `query`, ascending by distance
#[must_use]
pub fn nearest<'a>(query: &[f32], documents: &'a [VectorDocument], k: usize) -> Vec<(&'a VectorDocument, f32)> {
    let mut scored: Vec<(&VectorDocument, f32)> = documents
        .iter()
        .map(|doc| (doc, cosine_distance(query, &doc.embedding)))
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::DocumentMetadata;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn doc(name: &str, embedding: Vec<f32>) -> VectorDocument {
        VectorDocument {
            id: Uuid::new_v4(),
            page_content: name.to_owned(),
            metadata: DocumentMetadata {
                foodname: name.to_owned(),
                calory: "Unknown".to_owned(),
                index: 0.0,
                images: Vec::new(),
                canonical: Vec::new(),
                taken_time: String::new(),
                detailed_ingredients: BTreeMap::new(),
                questions: BTreeMap::new(),
            },
            embedding,
        }
    }

    #[test]
    fn test_cosine_distance_bounds() {
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert!((cosine_distance(&[0.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_orders_ascending_and_truncates() {
        let docs = vec![
            doc("far", vec![0.0, 1.0]),
            doc("near", vec![1.0, 0.1]),
            doc("opposite", vec![-1.0, 0.0]),
        ];
        let ranked = nearest(&[1.0, 0.0], &docs, 2);
        let names: Vec<&str> = ranked.iter().map(|(d, _)| d.metadata.foodname.as_str()).collect();
        assert_eq!(names, vec!["near", "far"]);
        assert!(ranked[0].1 <= ranked[1].1);
    }
}
