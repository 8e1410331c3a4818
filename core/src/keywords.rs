use crate::document::Document;
use crate::error::{Result, ScoreError};
use crate::normalizer::tokens;
use crate::weight::TermWeighter;
use std::cmp::Ordering;
use std::collections::HashMap;

/// The `count` most characteristic terms of `doc`, ranked by `w(t, doc)`.
///
/// Each term is reported in the surface form it takes most often in the text.
/// Equal weights fall back to the higher in-document count, then to the term itself.
pub fn keywords(weighter: &TermWeighter<'_>, doc: &Document, count: usize) -> Result<Vec<String>> {
    let index = weighter.index();
    let table = index.word_frequencies(doc);
    if table.is_empty() {
        return Err(ScoreError::empty_document(&doc.title));
    }

    let mut ranked = Vec::with_capacity(table.len());
    for (lemma, &tf) in &table {
        ranked.push((lemma.as_str(), tf, weighter.weight_lemma(lemma, doc)?));
    }
    ranked.sort_by(|a, b| {
        b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal).then(b.1.cmp(&a.1)).then(a.0.cmp(b.0))
    });
    ranked.truncate(count);

    let mut surfaces: HashMap<&str, HashMap<String, u32>> = ranked.iter().map(|(l, _, _)| (*l, HashMap::new())).collect();
    for token in tokens(&doc.text) {
        let term = index.normalizer().parse(token);
        if let Some(forms) = surfaces.get_mut(term.lemma.as_str()) {
            *forms.entry(token.to_lowercase()).or_insert(0) += 1;
        }
    }

    Ok(ranked
        .into_iter()
        .map(|(lemma, _, _)| {
            surfaces
                .get(lemma)
                .and_then(|forms| forms.iter().max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0))).map(|(f, _)| f.clone()))
                .unwrap_or_else(|| lemma.to_string())
        })
        .collect())
}
