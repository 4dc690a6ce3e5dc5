use ndpt_core::{EnergyCorrection, PerturbativeTerm, SigmaFactor};

pub fn sigma_latex(sigma: &SigmaFactor) -> String {
    let indices: Vec<String> = sigma.indices().iter().map(|i| i.to_string()).collect();
    format!("\\Sigma_{{{}}}", indices.join(","))
}

/// Product of factors of a term without its coefficient; empty for the
/// unit monomial.
fn monomial_latex(term: &PerturbativeTerm) -> String {
    let mut factors = Vec::new();
    match term.v_exp {
        0 => {}
        1 => factors.push("V_{00}".to_string()),
        k => factors.push(format!("V_{{00}}^{{{}}}", k)),
    }
    for (sigma, exp) in term.sigmas.sorted_items() {
        if exp == 1 {
            factors.push(sigma_latex(sigma));
        } else {
            factors.push(format!("{}^{{{}}}", sigma_latex(sigma), exp));
        }
    }
    factors.join(" ")
}

fn term_latex(term: &PerturbativeTerm, coeff: i64, leading: bool) -> String {
    let sign = match (leading, coeff < 0) {
        (true, false) => "",
        (true, true) => "-",
        (false, false) => " + ",
        (false, true) => " - ",
    };
    let monomial = monomial_latex(term);
    let magnitude = coeff.unsigned_abs();
    match (magnitude, monomial.is_empty()) {
        (_, true) => format!("{}{}", sign, magnitude),
        (1, false) => format!("{}{}", sign, monomial),
        (_, false) => format!("{}{} {}", sign, magnitude, monomial),
    }
}

/// `E^{(n)} = ...` with terms ordered by ascending `V_00` exponent.
pub fn correction_latex(correction: &EnergyCorrection) -> String {
    let mut out = format!("E^{{({})}} = ", correction.order());
    let mut leading = true;
    for terms in correction.terms_by_v00().values() {
        for (term, coeff) in terms {
            out.push_str(&term_latex(term, *coeff, leading));
            leading = false;
        }
    }
    if leading {
        out.push('0');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndpt_core::CompositionGenerator;

    #[test]
    fn test_third_order_latex() {
        let c = EnergyCorrection::compute(3, &CompositionGenerator::new()).unwrap();
        assert_eq!(correction_latex(&c), "E^{(3)} = \\Sigma_{1,1} - V_{00} \\Sigma_{2}");
    }

    #[test]
    fn test_powers_and_coefficients() {
        let c = EnergyCorrection::from_tuple((
            5,
            vec![
                (0, vec![(vec![(vec![2], 2)], 1)]),
                (1, vec![(vec![(vec![1], 1), (vec![3], 1)], 2)]),
                (3, vec![(vec![(vec![4], 1)], -1)]),
            ],
        ))
        .unwrap();
        assert_eq!(
            correction_latex(&c),
            "E^{(5)} = \\Sigma_{2}^{2} + 2 V_{00} \\Sigma_{1} \\Sigma_{3} - V_{00}^{3} \\Sigma_{4}"
        );
    }

    #[test]
    fn test_empty_correction() {
        let c = EnergyCorrection::from_tuple((4, Vec::new())).unwrap();
        assert_eq!(correction_latex(&c), "E^{(4)} = 0");
    }
}
