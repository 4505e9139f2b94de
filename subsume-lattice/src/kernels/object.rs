//! Object kernel: required names, size bounds, and the property-name
//! closure
//!
//! Property names form a regular language: declared names are literals,
//! `patternProperties` keys are patterns, and `additionalProperties`
//! governs the residue. Subtype checking partitions that namespace and
//! compares the schema each part maps to; the same pattern engine that
//! powers string constraints decides the name-language questions.

use crate::driver::{Merger, Subtyper};
use crate::kernels::string::literal_language;
use subsume_core::canonical::{ObjectConstraint, SchemaId};
use subsume_core::decision::Decision;
use subsume_core::error::Result;
use subsume_pattern::Pattern;

/// Every schema applicable to a concrete property name.
///
/// Declared entries are authoritative: construction already folds matching
/// pattern schemas into them, so a declared name has exactly one piece.
/// Undeclared names take their matching patterns (disjoint after
/// canonicalization, so normally one as well) or fall through to
/// `additional`.
fn applicable(o: &ObjectConstraint, name: &str) -> Vec<SchemaId> {
    if let Some(id) = o.property(name) {
        return vec![id];
    }
    let mut out: Vec<SchemaId> = o
        .pattern_properties
        .iter()
        .filter(|(pattern, _)| pattern.matches(name))
        .map(|(_, id)| *id)
        .collect();
    if out.is_empty() {
        out.push(o.additional);
    }
    out
}

/// The language of names that fall through to `additional`:
/// everything minus declared names minus pattern-matched names
fn additional_domain(o: &ObjectConstraint) -> Pattern {
    let mut domain = Pattern::universal();
    let names: Vec<&str> = o.properties.iter().map(|(n, _)| n.as_str()).collect();
    if !names.is_empty() {
        domain = domain.intersect(&literal_language(&names).complement());
    }
    for (pattern, _) in &o.pattern_properties {
        domain = domain.intersect(&pattern.complement());
    }
    domain
}

impl<'g, 'r> Subtyper<'g, 'r> {
    /// `x <: y` for object constraints
    pub(crate) fn object_subtype(
        &mut self,
        x: &ObjectConstraint,
        y: &ObjectConstraint,
    ) -> Result<Decision> {
        // The left side must require at least what the right requires
        if y.required.iter().any(|name| !x.required.contains(name)) {
            return Ok(Decision::No);
        }
        if x.min_properties < y.min_properties {
            return Ok(Decision::No);
        }
        match (x.max_properties, y.max_properties) {
            (None, Some(_)) => return Ok(Decision::No),
            (Some(a), Some(b)) if a > b => return Ok(Decision::No),
            _ => {}
        }

        let mut verdict = Decision::Yes;

        // Named closure over the names either side declares
        let mut names: Vec<&str> = x.properties.iter().map(|(n, _)| n.as_str()).collect();
        for (name, _) in &y.properties {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        for name in names {
            let x_pieces = applicable(x, name);
            // A name the left side forbids outright needs no check
            if x_pieces.len() == 1 && self.graph.is_bottom(x_pieces[0]) {
                continue;
            }
            for y_piece in applicable(y, name) {
                // One left piece is the common case (declared entries are
                // pre-merged, pattern regions disjoint). With several, the
                // name's true domain is their meet; requiring one piece to
                // fit is sound (a No may be conservative, a Yes never is).
                let mut best = Decision::No;
                for &x_piece in &x_pieces {
                    best = best.or(self.subtype_nodes(x_piece, y_piece)?);
                    if best == Decision::Yes {
                        break;
                    }
                }
                verdict = verdict.and(best);
                if verdict == Decision::No {
                    return Ok(Decision::No);
                }
            }
        }

        // Pattern closure: each left pattern's names must be covered on
        // the right
        let y_names: Vec<&str> = y.properties.iter().map(|(n, _)| n.as_str()).collect();
        for (px, sx) in &x.pattern_properties {
            verdict = verdict.and(self.cover_name_language(px, *sx, y, &y_names)?);
            if verdict == Decision::No {
                return Ok(Decision::No);
            }
        }

        // Additional closure: names falling through the left side's
        // declarations
        if !self.graph.is_bottom(x.additional) {
            let domain = additional_domain(x);
            if !domain.is_empty() {
                verdict =
                    verdict.and(self.cover_name_language(&domain, x.additional, y, &y_names)?);
            }
        }

        Ok(verdict)
    }

    /// Require `schema` (governing every name in `language` on the left)
    /// to be covered by whatever governs those names on the right
    fn cover_name_language(
        &mut self,
        language: &Pattern,
        schema: SchemaId,
        y: &ObjectConstraint,
        y_names: &[&str],
    ) -> Result<Decision> {
        let mut verdict = Decision::Yes;
        // Explicitly declared right-side names were handled exactly in the
        // named closure; only the rest of the language needs covering here
        let mut residual = language.clone();
        if !y_names.is_empty() {
            residual = residual.intersect(&literal_language(y_names).complement());
        }
        let uncovered = residual.clone();
        for (py, sy) in &y.pattern_properties {
            if !uncovered.intersect(py).is_empty() {
                verdict = verdict.and(self.subtype_nodes(schema, *sy)?);
                if verdict == Decision::No {
                    return Ok(Decision::No);
                }
            }
            residual = residual.intersect(&py.complement());
        }
        if !residual.is_empty() {
            verdict = verdict.and(self.subtype_nodes(schema, y.additional)?);
        }
        Ok(verdict)
    }
}

impl<'g, 'r> Merger<'g, 'r> {
    /// Greatest lower bound of two object constraints.
    ///
    /// Both pattern lists carry over verbatim (conjunction of constraints),
    /// declared names fold in the other side's named-or-additional piece,
    /// and the additionals meet.
    pub(crate) fn object_meet(
        &mut self,
        x: &ObjectConstraint,
        y: &ObjectConstraint,
    ) -> ObjectConstraint {
        let mut required = x.required.clone();
        for name in &y.required {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }
        required.sort();

        let mut names: Vec<String> = x.properties.iter().map(|(n, _)| n.clone()).collect();
        for (name, _) in &y.properties {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        let mut properties = Vec::with_capacity(names.len());
        for name in names {
            let px = self.named_piece(x, &name);
            let py = self.named_piece(y, &name);
            let met = self.meet_nodes(px, py);
            properties.push((name, met));
        }

        let mut pattern_properties = x.pattern_properties.clone();
        for (pattern, id) in &y.pattern_properties {
            let duplicate = pattern_properties
                .iter()
                .any(|(p, i)| p.source() == pattern.source() && i == id);
            if !duplicate {
                pattern_properties.push((pattern.clone(), *id));
            }
        }

        ObjectConstraint {
            min_properties: x.min_properties.max(y.min_properties),
            max_properties: match (x.max_properties, y.max_properties) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, None) => a,
                (None, b) => b,
            },
            required,
            properties,
            pattern_properties,
            additional: self.meet_nodes(x.additional, y.additional),
        }
    }

    /// The full domain of one name on one side: the declared property
    /// (which already carries any folded pattern schemas), the meet of the
    /// matching patterns, or `additional`. Keeping the result's declared
    /// entries complete preserves the invariant the subtype kernel relies
    /// on.
    fn named_piece(&mut self, o: &ObjectConstraint, name: &str) -> SchemaId {
        if let Some(id) = o.property(name) {
            return id;
        }
        let matching: Vec<SchemaId> = o
            .pattern_properties
            .iter()
            .filter(|(pattern, _)| pattern.matches(name))
            .map(|(_, id)| *id)
            .collect();
        match matching.split_first() {
            Some((&first, rest)) => rest
                .iter()
                .fold(first, |acc, &id| self.meet_nodes(acc, id)),
            None => o.additional,
        }
    }
}
