//! HTML highlight markup of terms inside raw text.

use regex::Regex;

use crate::knowledge::Tokenizer;

/// Wrap every occurrence of each term in a highlight span.
///
/// Longer terms are marked first so their words are not claimed by shorter
/// terms. A term containing commas is treated as a list of variants. For
/// single-word terms every surface form found by
/// [`Tokenizer::lemma_forms`] is marked. Matching is case-insensitive, lets
/// dots sit between letters (`F.D.A` for `fda`), lets spaces match hyphens,
/// ignores matches glued to other letters and never touches text inside an
/// HTML tag. When a form is not found verbatim, one trailing letter is
/// allowed, which catches phrases learned only in their lemma form.
pub fn highlight<S: AsRef<str>>(raw: &str, terms: &[S], tokenizer: &dyn Tokenizer) -> String {
    let mut ordered: Vec<&str> = terms.iter().map(AsRef::as_ref).collect();
    ordered.sort_unstable();
    ordered.dedup();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut doc = raw.to_string();
    for t in ordered {
        for variant in t.split(',').map(str::trim).filter(|v| !v.is_empty()) {
            let mut forms: Vec<String> = if tokenizer.gram_size(variant) == 1 {
                tokenizer.lemma_forms(variant, &doc).into_iter().collect()
            } else {
                vec![variant.to_string()]
            };
            forms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

            for form in forms {
                doc = mark_form(&doc, &form, variant);
            }
        }
    }
    doc
}

fn mark_form(doc: &str, form: &str, term: &str) -> String {
    let body = form_pattern(form);
    if body.is_empty() {
        return doc.to_string();
    }

    let exact = format!(r"(?i)(^|[^A-Za-z])({body})");
    if let Ok(re) = Regex::new(&exact) {
        let (marked, count) = wrap_matches(doc, &re, term, true);
        if count > 0 {
            return marked;
        }
    }

    let loose = format!(r"(?i)(^|[^A-Za-z])({body}[A-Za-z]?)");
    match Regex::new(&loose) {
        Ok(re) => wrap_matches(doc, &re, term, false).0,
        Err(_) => doc.to_string(),
    }
}

/// Characters of the form joined by optional dots; spaces match whitespace or hyphens.
fn form_pattern(form: &str) -> String {
    form.chars()
        .map(|c| {
            if c == ' ' {
                r"[\s-]".to_string()
            } else {
                regex::escape(&c.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join(r"[.]?")
}

/// Wrap matches outside tags and existing highlights, returning the new text
/// and how many were wrapped.
///
/// With `bounded`, a match directly followed by a letter is skipped. The
/// following character is checked by hand rather than consumed, so
/// occurrences separated by a single character are all found.
fn wrap_matches(doc: &str, re: &Regex, term: &str, bounded: bool) -> (String, usize) {
    let mut out = String::with_capacity(doc.len());
    let mut last = 0;
    let mut count = 0;

    for caps in re.captures_iter(doc) {
        let Some(body) = caps.get(2) else {
            continue;
        };
        let rest = &doc[body.end()..];
        if bounded && rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            continue;
        }
        if !outside_tag(rest) || inside_highlight(&doc[..body.start()]) {
            continue;
        }
        out.push_str(&doc[last..body.start()]);
        out.push_str(&span(term, body.as_str()));
        last = body.end();
        count += 1;
    }
    out.push_str(&doc[last..]);
    (out, count)
}

const HIGHLIGHT_OPEN: &str = r#"<span class="highlight""#;

fn span(term: &str, text: &str) -> String {
    format!(r#"{HIGHLIGHT_OPEN} data-term="{term}">{text}</span>"#)
}

/// True unless the text ahead closes a tag before opening one.
fn outside_tag(rest: &str) -> bool {
    match rest.find(['<', '>']) {
        Some(i) => rest.as_bytes()[i] == b'<',
        None => true,
    }
}

/// True if the text before a match leaves a highlight span open.
fn inside_highlight(before: &str) -> bool {
    match before.rfind(HIGHLIGHT_OPEN) {
        Some(open) => !before[open..].contains("</span>"),
        None => false,
    }
}
