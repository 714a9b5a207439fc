//! Chinese financial numerals (大写金额) for receipt totals.

const DIGITS: [char; 10] = ['零', '壹', '贰', '叁', '肆', '伍', '陆', '柒', '捌', '玖'];
const UNITS: [&str; 4] = ["", "拾", "佰", "仟"];
const BIG_UNITS: [&str; 3] = ["", "万", "亿"];

/// Renders an amount in yuan, e.g. `1005.03` → `壹仟零伍元叁分`.
///
/// The amount is rounded to the fen. Inner runs of zeros collapse to a single
/// 零 and trailing zeros are dropped. An amount without jiao and fen ends in 整.
pub fn amount_in_words(amount: f64) -> String {
    if !amount.is_finite() {
        return String::new();
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let yuan = cents / 100;
    let jiao = ((cents / 10) % 10) as usize;
    let fen = (cents % 10) as usize;

    let mut out = String::new();
    if amount < 0.0 && cents > 0 {
        out.push('负');
    }
    out.push_str(&integer_in_words(yuan));
    out.push('元');

    if jiao == 0 && fen == 0 {
        out.push('整');
        return out;
    }
    if jiao > 0 {
        out.push(DIGITS[jiao]);
        out.push('角');
    }
    if fen > 0 {
        out.push(DIGITS[fen]);
        out.push('分');
    }
    out
}

fn integer_in_words(value: u64) -> String {
    if value == 0 {
        return DIGITS[0].to_string();
    }

    // four-digit groups, most significant first
    let mut groups = Vec::new();
    let mut rest = value;
    while rest > 0 {
        groups.push((rest % 10_000) as usize);
        rest /= 10_000;
    }
    groups.reverse();

    let mut out = String::new();
    let mut pending_zero = false;
    let count = groups.len();

    for (i, &group) in groups.iter().enumerate() {
        let big_unit = big_unit(count - 1 - i);
        if group == 0 {
            pending_zero = !out.is_empty();
            continue;
        }

        let digits = [group / 1000, group / 100 % 10, group / 10 % 10, group % 10];
        for (pos, &digit) in digits.iter().enumerate() {
            if digit == 0 {
                if !out.is_empty() {
                    pending_zero = true;
                }
                continue;
            }
            if pending_zero {
                out.push(DIGITS[0]);
                pending_zero = false;
            }
            out.push(DIGITS[digit]);
            out.push_str(UNITS[3 - pos]);
        }
        out.push_str(&big_unit);
    }
    out
}

// 万 and 亿 compose beyond 亿亿, e.g. 10^16 → 万亿亿.
fn big_unit(index: usize) -> String {
    if index < BIG_UNITS.len() {
        return BIG_UNITS[index].to_string();
    }
    let mut unit = BIG_UNITS[index % 2].to_string();
    for _ in 0..index / 2 {
        unit.push_str(BIG_UNITS[2]);
    }
    unit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero() {
        assert_eq!(amount_in_words(0.0), "零元整");
    }

    #[test]
    fn whole_amounts_end_in_zheng() {
        assert_eq!(amount_in_words(100.0), "壹佰元整");
        assert_eq!(amount_in_words(10.0), "壹拾元整");
        assert_eq!(amount_in_words(10_000.0), "壹万元整");
        assert_eq!(amount_in_words(120_000.0), "壹拾贰万元整");
    }

    #[test]
    fn jiao_and_fen() {
        assert_eq!(amount_in_words(100.50), "壹佰元伍角");
        assert_eq!(amount_in_words(0.05), "零元伍分");
        assert_eq!(amount_in_words(3.21), "叁元贰角壹分");
    }

    #[test]
    fn inner_zeros_collapse_once() {
        assert_eq!(amount_in_words(1005.03), "壹仟零伍元叁分");
        assert_eq!(amount_in_words(1001.0), "壹仟零壹元整");
        assert_eq!(amount_in_words(1010.0), "壹仟零壹拾元整");
    }

    #[test]
    fn zeros_across_groups() {
        assert_eq!(amount_in_words(10_001.0), "壹万零壹元整");
        assert_eq!(amount_in_words(100_010_000.0), "壹亿零壹万元整");
        assert_eq!(amount_in_words(100_000_001.0), "壹亿零壹元整");
        assert_eq!(amount_in_words(12_345_678.9), "壹仟贰佰叁拾肆万伍仟陆佰柒拾捌元玖角");
        assert_eq!(amount_in_words(200_000_000.0), "贰亿元整");
    }

    #[test]
    fn rounds_to_the_fen() {
        assert_eq!(amount_in_words(99.999), "壹佰元整");
        assert_eq!(amount_in_words(-12.5), "负壹拾贰元伍角");
    }
}
