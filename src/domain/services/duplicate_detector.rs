// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::ImageSample;
use crate::utils::url_utils;
use image::RgbImage;
use std::collections::{BTreeSet, HashSet};

/// 重复图片分组
///
/// 键为最先出现的图片，值为与其完全相同的后续图片
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateGroups {
    groups: Vec<(String, BTreeSet<String>)>,
}

impl DuplicateGroups {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// 以 `first_seen` 为首的分组
    pub fn get(&self, first_seen: &str) -> Option<&BTreeSet<String>> {
        self.groups
            .iter()
            .find(|(root, _)| root == first_seen)
            .map(|(_, dupes)| dupes)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.groups.iter().map(|(root, dupes)| (root.as_str(), dupes))
    }

    /// 所有被判定为重复的图片（不含各组的首图）
    pub fn all_duplicates(&self) -> BTreeSet<String> {
        self.groups
            .iter()
            .flat_map(|(_, dupes)| dupes.iter().cloned())
            .collect()
    }
}

/// 精确重复检测器
///
/// 两两比较标准化位图，逐通道差值之和为零即为重复。复杂度为O(n²)，
/// 单页面图片数量在几十张的量级。
#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    excluded_domains: Vec<String>,
}

impl DuplicateDetector {
    pub fn new(excluded_domains: Vec<String>) -> Self {
        Self { excluded_domains }
    }

    /// 查找重复图片
    ///
    /// 同一URL多次出现只取第一次；没有位图或属于排除名单的样本不参与比较。
    pub fn find_duplicates(&self, samples: &[ImageSample]) -> DuplicateGroups {
        let mut seen = HashSet::new();
        let candidates: Vec<(&str, &RgbImage)> = samples
            .iter()
            .filter(|s| seen.insert(s.url.as_str()))
            .filter(|s| !url_utils::contains_any_ignore_case(&s.url, &self.excluded_domains))
            .filter_map(|s| s.bitmap.as_ref().map(|b| (s.url.as_str(), b)))
            .collect();

        let mut assigned = vec![false; candidates.len()];
        let mut groups = Vec::new();

        for i in 0..candidates.len() {
            if assigned[i] {
                continue;
            }
            let (root_url, root_bitmap) = candidates[i];
            let mut dupes = BTreeSet::new();

            for j in (i + 1)..candidates.len() {
                if assigned[j] {
                    continue;
                }
                let (other_url, other_bitmap) = candidates[j];
                if is_exact_duplicate(root_bitmap, other_bitmap) {
                    dupes.insert(other_url.to_string());
                    assigned[j] = true;
                }
            }

            if !dupes.is_empty() {
                groups.push((root_url.to_string(), dupes));
            }
        }

        DuplicateGroups { groups }
    }
}

/// 逐通道绝对差之和是否为零
pub fn is_exact_duplicate(a: &RgbImage, b: &RgbImage) -> bool {
    if a.dimensions() != b.dimensions() {
        return false;
    }
    let diff: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(256, 256, Rgb(color))
    }

    #[test]
    fn test_black_pair_grouped_white_excluded() {
        let samples = vec![
            ImageSample::ok("https://e.com/black1.png", solid([0, 0, 0])),
            ImageSample::ok("https://e.com/black2.png", solid([0, 0, 0])),
            ImageSample::ok("https://e.com/white.png", solid([255, 255, 255])),
        ];

        let groups = DuplicateDetector::default().find_duplicates(&samples);

        assert_eq!(groups.len(), 1);
        let dupes = groups.get("https://e.com/black1.png").unwrap();
        assert!(dupes.contains("https://e.com/black2.png"));
        assert!(!dupes.contains("https://e.com/white.png"));
        assert!(!groups.all_duplicates().contains("https://e.com/white.png"));
    }

    #[test]
    fn test_single_value_difference_is_not_duplicate() {
        let a = solid([10, 20, 30]);
        let mut b = a.clone();
        b.get_pixel_mut(100, 200).0[2] = 31;

        assert!(!is_exact_duplicate(&a, &b));
        let groups = DuplicateDetector::default().find_duplicates(&[
            ImageSample::ok("https://e.com/a.png", a),
            ImageSample::ok("https://e.com/b.png", b),
        ]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_url_is_never_paired_with_itself() {
        let samples = vec![
            ImageSample::ok("https://e.com/logo.png", solid([1, 2, 3])),
            ImageSample::ok("https://e.com/logo.png", solid([1, 2, 3])),
        ];
        let groups = DuplicateDetector::default().find_duplicates(&samples);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_three_identical_form_one_group() {
        let samples = vec![
            ImageSample::ok("https://e.com/1.png", solid([5, 5, 5])),
            ImageSample::ok("https://e.com/2.png", solid([5, 5, 5])),
            ImageSample::ok("https://e.com/3.png", solid([5, 5, 5])),
        ];
        let groups = DuplicateDetector::default().find_duplicates(&samples);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups.all_duplicates(),
            ["https://e.com/2.png", "https://e.com/3.png"]
                .iter()
                .map(|s| s.to_string())
                .collect::<BTreeSet<String>>()
        );
    }

    #[test]
    fn test_missing_bitmaps_and_excluded_domains_are_skipped() {
        let samples = vec![
            ImageSample::ok("https://e.com/a.png", solid([0, 0, 0])),
            ImageSample::broken("https://e.com/broken.png"),
            ImageSample::placeholder("https://e.com/placeholder.png"),
            ImageSample::ok(
                "https://storage.googleapis.com/b/a.png",
                solid([0, 0, 0]),
            ),
        ];
        let detector = DuplicateDetector::new(vec!["storage.googleapis.com".to_string()]);
        assert!(detector.find_duplicates(&samples).is_empty());
    }
}
