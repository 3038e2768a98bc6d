//! LaTeX rendering of candidate factor triples.

use matmul_rl_factors::Triple;
use ndarray::Array2;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;

/// Denominators up to this size are printed as fractions.
const MAX_FRACTION_DENOM: u32 = 64;

/// Render a `longtable` with one row per triple and each factor as a `bmatrix`.
pub fn render_latex(triples: &[Triple]) -> String {
    let mut lines = vec![
        format!("% LaTeX table for rank-{} factor triples", triples.len()),
        r"\begin{longtable}{cccc}".to_string(),
        r"\toprule".to_string(),
        r"$i$ & $U_i$ & $V_i$ & $W_i$ \\".to_string(),
        r"\midrule".to_string(),
    ];

    for (i, triple) in triples.iter().enumerate() {
        lines.push(format!(
            r"{} & ${}$ & ${}$ & ${}$ \\",
            i + 1,
            bmatrix(&triple.u),
            bmatrix(&triple.v),
            bmatrix(&triple.w)
        ));
    }

    lines.push(r"\bottomrule".to_string());
    lines.push(r"\end{longtable}".to_string());
    lines.join("\n") + "\n"
}

fn bmatrix(matrix: &Array2<f64>) -> String {
    let rows: Vec<String> = matrix
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|&x| format_entry(x))
                .collect::<Vec<_>>()
                .join(" & ")
        })
        .collect();
    format!(r"\begin{{bmatrix}} {} \end{{bmatrix}}", rows.join(r" \\ "))
}

fn format_entry(value: f64) -> String {
    let Some(exact) = BigRational::from_float(value) else {
        return format!(r"\text{{{}}}", value);
    };
    if exact.is_integer() {
        return exact.to_integer().to_string();
    }
    if exact.denom() <= &BigInt::from(MAX_FRACTION_DENOM) {
        let sign = if exact.numer().is_negative() { "-" } else { "" };
        return format!(r"{}\tfrac{{{}}}{{{}}}", sign, exact.numer().abs(), exact.denom());
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use matmul_rl_factors::identity_seed;

    #[test]
    fn test_header_comment_names_rank() {
        let latex = render_latex(&identity_seed(4));
        assert!(latex.starts_with("% LaTeX table for rank-1 factor triples\n"));
        assert!(latex.contains(r"\begin{longtable}"));
        assert!(latex.trim_end().ends_with(r"\end{longtable}"));
    }

    #[test]
    fn test_one_row_per_triple() {
        let triples = vec![Triple::identity(2), Triple::zeros(2), Triple::identity(2)];
        let latex = render_latex(&triples);
        let rows = latex.lines().filter(|l| l.contains(r"\begin{bmatrix}")).count();
        assert_eq!(rows, 3);
        assert!(latex.contains(r"\begin{bmatrix} 1 & 0 \\ 0 & 1 \end{bmatrix}"));
    }

    #[test]
    fn test_empty_candidate_renders_empty_table() {
        let latex = render_latex(&[]);
        assert!(latex.starts_with("% LaTeX table for rank-0 factor triples"));
        assert!(!latex.contains("bmatrix"));
    }

    #[test]
    fn test_entry_formatting() {
        assert_eq!(format_entry(0.0), "0");
        assert_eq!(format_entry(-0.0), "0");
        assert_eq!(format_entry(-3.0), "-3");
        assert_eq!(format_entry(0.5), r"\tfrac{1}{2}");
        assert_eq!(format_entry(-0.375), r"-\tfrac{3}{8}");
        assert_eq!(format_entry(0.1), "0.1");
    }
}
