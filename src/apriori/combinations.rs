use super::key::AttributeValueId;

/// Calls `callback` with every `k`-combination of `items`, each in the order
/// the elements appear in `items`. For a sorted input every combination is
/// sorted too.
pub fn for_each_combination<F>(items: &[AttributeValueId], k: usize, callback: &mut F)
where
    F: FnMut(&[AttributeValueId]),
{
    if k == 0 || k > items.len() {
        return;
    }
    let mut current = Vec::with_capacity(k);
    generate_combinations_recursive(items, k, 0, &mut current, callback);
}

pub fn generate_combinations_recursive<F>(
    items: &[AttributeValueId],
    k: usize,
    start: usize,
    current: &mut Vec<AttributeValueId>,
    callback: &mut F,
) where
    F: FnMut(&[AttributeValueId]),
{
    if current.len() == k {
        callback(current);
        return;
    }

    // stop once too few items remain to fill the combination
    let needed = k - current.len();
    for i in start..=items.len() - needed {
        current.push(items[i]);
        generate_combinations_recursive(items, k, i + 1, current, callback);
        current.pop();
    }
}

pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: usize = 1;
    for i in 0..k {
        result = result.saturating_mul(n - i) / (i + 1);
    }
    result
}
