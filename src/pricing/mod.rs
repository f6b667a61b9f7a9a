/// Pricing Engine
///
/// Pure, deterministic constant-product math on smallest-denomination token
/// units. Everything is integer-only: intermediate products are computed in
/// `u128`, which is exact for any pair of 64-bit amounts, and every division
/// truncates toward zero. The systematic floor rounding favors the pool over
/// the user on every operation; that is the intended conservative policy.
use crate::utils::constants::BPS_DENOMINATOR;

/// Swap output for the constant-product curve, fee deducted from the input.
///
/// `amount_out = floor(reserve_out * in_after_fee / (reserve_in + in_after_fee))`
/// where `in_after_fee = floor(amount_in * (10000 - fee_bps) / 10000)`.
///
/// Returns 0 for degenerate inputs (zero amount, unseeded reserves, fee at or
/// above 100%); a zero quote is a quote failure, not an error.
pub fn quote_swap_output(amount_in: u64, reserve_in: u64, reserve_out: u64, fee_bps: u32) -> u64 {
    if amount_in == 0 || reserve_in == 0 || reserve_out == 0 {
        return 0;
    }
    if fee_bps >= BPS_DENOMINATOR {
        return 0;
    }

    let in_after_fee =
        (amount_in as u128) * ((BPS_DENOMINATOR - fee_bps) as u128) / (BPS_DENOMINATOR as u128);

    let numerator = (reserve_out as u128) * in_after_fee;
    let denominator = (reserve_in as u128) + in_after_fee;
    (numerator / denominator) as u64
}

/// Liquidity units minted for a two-sided deposit.
///
/// First deposit (no units outstanding or either reserve empty) mints
/// `floor(sqrt(amount_a * amount_b))`. Subsequent deposits mint
/// `min(floor(a * total / reserve_a), floor(b * total / reserve_b))`; the
/// minimum stops a depositor minting more share than either side of the
/// deposit justifies when the amounts are off the current ratio.
///
/// Returned as `u128` because skewed-but-valid inputs (tiny reserve, huge
/// deposit) can produce a share beyond `u64`; the caller decides whether an
/// over-wide result is representable, never this function.
pub fn quote_mint_units(
    amount_a: u64,
    amount_b: u64,
    reserve_a: u64,
    reserve_b: u64,
    total_units: u64,
) -> u128 {
    if amount_a == 0 || amount_b == 0 {
        return 0;
    }
    if total_units == 0 || reserve_a == 0 || reserve_b == 0 {
        return isqrt((amount_a as u128) * (amount_b as u128));
    }

    let by_a = (amount_a as u128) * (total_units as u128) / (reserve_a as u128);
    let by_b = (amount_b as u128) * (total_units as u128) / (reserve_b as u128);
    by_a.min(by_b)
}

/// Proportional withdrawal amounts for burning `units` of `total_units`.
/// Returns `(0, 0)` when nothing is outstanding.
pub fn quote_burn_amounts(
    units: u64,
    reserve_a: u64,
    reserve_b: u64,
    total_units: u64,
) -> (u64, u64) {
    if units == 0 || total_units == 0 {
        return (0, 0);
    }
    let out_a = (reserve_a as u128) * (units as u128) / (total_units as u128);
    let out_b = (reserve_b as u128) * (units as u128) / (total_units as u128);
    (out_a as u64, out_b as u64)
}

/// Minimum acceptable output after the caller's slippage tolerance.
pub fn apply_slippage(amount_out: u64, slippage_bps: u32) -> u64 {
    if slippage_bps >= BPS_DENOMINATOR {
        return 0;
    }
    ((amount_out as u128) * ((BPS_DENOMINATOR - slippage_bps) as u128)
        / (BPS_DENOMINATOR as u128)) as u64
}

/// Integer square root by Newton's method, `floor(sqrt(n))`.
/// Exact for the full `u128` range. The seed `2^(ilog2(n)/2 + 1)` is always
/// at least `sqrt(n)`, so the iteration descends monotonically to the floor.
pub fn isqrt(n: u128) -> u128 {
    if n < 4 {
        return if n == 0 { 0 } else { 1 };
    }
    let mut x = 1u128 << (n.ilog2() / 2 + 1);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}
