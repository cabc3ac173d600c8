//! 乱序工具
//!
//! 题目顺序和选项顺序都通过这里打乱。

use rand::seq::SliceRandom;
use rand::Rng;

/// 返回一个均匀随机排列的新 Vec，不修改输入
pub fn shuffled<T: Clone>(items: &[T]) -> Vec<T> {
    shuffled_with(items, &mut rand::thread_rng())
}

/// 使用指定随机源打乱，测试时可传入固定种子的 `StdRng`
///
/// `SliceRandom::shuffle` 是 Fisher–Yates：i 从末尾递减到 1，
/// 与 [0, i] 中均匀选出的位置交换。
pub fn shuffled_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shuffle_is_permutation() {
        let input: Vec<u32> = (0..50).collect();
        let out = shuffled(&input);

        assert_eq!(out.len(), input.len());
        let mut sorted = out.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, input);
    }

    #[test]
    fn test_shuffle_does_not_mutate_input() {
        let input = vec!["A", "B", "C", "D"];
        let snapshot = input.clone();
        let _ = shuffled(&input);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let input: Vec<u32> = (0..20).collect();
        let a = shuffled_with(&input, &mut StdRng::seed_from_u64(7));
        let b = shuffled_with(&input, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_handles_empty_and_single() {
        let empty: Vec<u8> = Vec::new();
        assert!(shuffled(&empty).is_empty());
        assert_eq!(shuffled(&[42]), vec![42]);
    }

    #[test]
    fn test_shuffle_is_roughly_uniform() {
        // 3 个元素共 6 种排列，每种期望约 1000 次
        let mut rng = StdRng::seed_from_u64(1);
        let input = [0u8, 1, 2];
        let mut counts = std::collections::HashMap::new();
        for _ in 0..6000 {
            *counts.entry(shuffled_with(&input, &mut rng)).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), 6);
        for count in counts.values() {
            assert!((800..1200).contains(count), "排列次数偏差过大: {}", count);
        }
    }
}
