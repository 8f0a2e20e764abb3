//! Lab-name normalization and display labels.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Name used when a metric arrives without any name.
pub const UNKNOWN_METRIC: &str = "desconhecido";

/// Spelling, accent and abbreviation variants mapped to one canonical name.
const NAME_VARIANTS: &[(&str, &str)] = &[
    // hemogram
    ("hemacias", "eritrócitos"),
    ("hemácias", "eritrócitos"),
    ("eritrócitos", "eritrócitos"),
    ("eritrocitos", "eritrócitos"),
    ("hemoglobina", "hemoglobina"),
    ("hgb", "hemoglobina"),
    ("hb", "hemoglobina"),
    ("hematócrito", "hematócrito"),
    ("hematocrito", "hematócrito"),
    ("ht", "hematócrito"),
    ("htc", "hematócrito"),
    ("v.c.m.", "vcm"),
    ("vcm", "vcm"),
    ("volume corpuscular médio", "vcm"),
    ("h.c.m.", "hcm"),
    ("hcm", "hcm"),
    ("hemoglobina corpuscular média", "hcm"),
    ("c.h.c.m.", "chcm"),
    ("chcm", "chcm"),
    ("concentração de hemoglobina corpuscular média", "chcm"),
    ("rdw", "rdw"),
    ("r.d.w.", "rdw"),
    ("rdw-cv", "rdw"),
    ("rdw-sd", "rdw-sd"),
    ("amplitude de distribuição dos eritrócitos", "rdw"),
    // leukogram
    ("leucócitos", "leucócitos"),
    ("leucocitos", "leucócitos"),
    ("wbc", "leucócitos"),
    ("leucograma", "leucócitos"),
    ("neutrófilos", "neutrófilos"),
    ("neutrofilos", "neutrófilos"),
    ("segmentados", "neutrófilos"),
    ("bastonetes", "bastonetes"),
    ("eosinófilos", "eosinófilos"),
    ("eosinofilos", "eosinófilos"),
    ("basófilos", "basófilos"),
    ("basofilos", "basófilos"),
    ("linfócitos", "linfócitos"),
    ("linfocitos", "linfócitos"),
    ("monócitos", "monócitos"),
    ("monocitos", "monócitos"),
    // platelets
    ("plaquetas", "plaquetas"),
    ("plt", "plaquetas"),
    ("contagem de plaquetas", "plaquetas"),
    // glucose
    ("glicose", "glicose"),
    ("glicemia", "glicose"),
    ("glicemia de jejum", "glicose"),
    ("glic.", "glicose"),
    ("gli", "glicose"),
    // lipids
    ("colesterol total", "colesterol total"),
    ("colesterol", "colesterol total"),
    ("col. total", "colesterol total"),
    ("col total", "colesterol total"),
    ("hdl", "colesterol hdl"),
    ("hdl-colesterol", "colesterol hdl"),
    ("colesterol hdl", "colesterol hdl"),
    ("hdl-c", "colesterol hdl"),
    ("ldl", "colesterol ldl"),
    ("ldl-colesterol", "colesterol ldl"),
    ("colesterol ldl", "colesterol ldl"),
    ("ldl-c", "colesterol ldl"),
    ("vldl", "colesterol vldl"),
    ("vldl-colesterol", "colesterol vldl"),
    ("colesterol vldl", "colesterol vldl"),
    ("vldl-c", "colesterol vldl"),
    ("triglicerídeos", "triglicerídeos"),
    ("triglicerideos", "triglicerídeos"),
    ("triglicérides", "triglicerídeos"),
    ("triglicerides", "triglicerídeos"),
    ("tg", "triglicerídeos"),
    // liver
    ("tgo", "tgo"),
    ("ast", "tgo"),
    ("aspartato aminotransferase", "tgo"),
    ("transaminase glutâmica oxalacética", "tgo"),
    ("tgp", "tgp"),
    ("alt", "tgp"),
    ("alanina aminotransferase", "tgp"),
    ("transaminase glutâmica pirúvica", "tgp"),
    ("gama gt", "gama gt"),
    ("ggt", "gama gt"),
    ("gama glutamil transferase", "gama gt"),
    ("gama glutamil transpeptidase", "gama gt"),
    ("γ-gt", "gama gt"),
    ("fosfatase alcalina", "fosfatase alcalina"),
    ("fa", "fosfatase alcalina"),
    ("fosf alc", "fosfatase alcalina"),
    ("bilirubina total", "bilirubina total"),
    ("bt", "bilirubina total"),
    ("bilirrubina total", "bilirubina total"),
    ("bilirubina direta", "bilirubina direta"),
    ("bd", "bilirubina direta"),
    ("bilirrubina direta", "bilirubina direta"),
    ("bilirubina indireta", "bilirubina indireta"),
    ("bi", "bilirubina indireta"),
    ("bilirrubina indireta", "bilirubina indireta"),
    // kidney
    ("ureia", "ureia"),
    ("uréia", "ureia"),
    ("ur", "ureia"),
    ("bun", "ureia"),
    ("nitrogênio ureico", "ureia"),
    ("creatinina", "creatinina"),
    ("cr", "creatinina"),
    ("creat", "creatinina"),
    ("clearance de creatinina", "clearance de creatinina"),
    ("ácido úrico", "ácido úrico"),
    ("acido urico", "ácido úrico"),
    ("au", "ácido úrico"),
    // electrolytes
    ("sódio", "sódio"),
    ("sodio", "sódio"),
    ("na", "sódio"),
    ("na+", "sódio"),
    ("potássio", "potássio"),
    ("potassio", "potássio"),
    ("k", "potássio"),
    ("k+", "potássio"),
    ("cálcio", "cálcio"),
    ("calcio", "cálcio"),
    ("ca", "cálcio"),
    ("ca++", "cálcio"),
    ("fósforo", "fósforo"),
    ("fosforo", "fósforo"),
    ("p", "fósforo"),
    ("magnésio", "magnésio"),
    ("magnesio", "magnésio"),
    ("mg", "magnésio"),
    ("ferro", "ferro"),
    ("fe", "ferro"),
    // proteins
    ("proteínas totais", "proteínas totais"),
    ("proteinas totais", "proteínas totais"),
    ("prot. totais", "proteínas totais"),
    ("pt", "proteínas totais"),
    ("albumina", "albumina"),
    ("alb", "albumina"),
    ("globulina", "globulina"),
    ("glob", "globulina"),
    ("relação albumina/globulina", "relação albumina/globulina"),
    ("rel a/g", "relação albumina/globulina"),
    // coagulation
    ("tempo de protrombina", "tempo de protrombina"),
    ("tp", "tempo de protrombina"),
    ("tpae", "tempo de tromboplastina parcial ativada"),
    ("ttpa", "tempo de tromboplastina parcial ativada"),
    ("tempo de tromboplastina parcial ativada", "tempo de tromboplastina parcial ativada"),
    ("kttp", "tempo de tromboplastina parcial ativada"),
    ("inr", "inr"),
    ("razão normalizada internacional", "inr"),
    // inflammation
    ("vhs", "vhs"),
    ("hemossedimentação", "vhs"),
    ("velocidade de hemossedimentação", "vhs"),
    ("pcr", "proteína c reativa"),
    ("proteína c reativa", "proteína c reativa"),
    ("proteina c reativa", "proteína c reativa"),
    // hormones
    ("tsh", "tsh"),
    ("hormônio estimulante da tireoide", "tsh"),
    ("t4", "t4"),
    ("t4 livre", "t4 livre"),
    ("t4l", "t4 livre"),
    ("tiroxina livre", "t4 livre"),
    ("t3", "t3"),
    ("t3 livre", "t3 livre"),
    ("t3l", "t3 livre"),
    ("insulina", "insulina"),
    // vitamins and others
    ("ferritina", "ferritina"),
    ("vitamina d", "vitamina d"),
    ("25-hidroxivitamina d", "vitamina d"),
    ("vitamina b12", "vitamina b12"),
    ("b12", "vitamina b12"),
    ("acido folico", "ácido fólico"),
    ("ácido fólico", "ácido fólico"),
    ("hemoglobina glicada", "hemoglobina glicada"),
    ("hba1c", "hemoglobina glicada"),
    ("a1c", "hemoglobina glicada"),
];

/// Words always rendered in upper case.
const ACRONYMS: &[&str] = &[
    "vcm", "hcm", "chcm", "rdw", "tsh", "t3", "t4", "ldl", "hdl", "vhs", "pcr", "inr", "ige",
    "igg", "iga", "igm", "hbsag", "psa", "ca", "cea", "afp", "ck", "ldh", "ggt", "ast", "alt",
    "tgo", "tgp", "fa", "dhl", "cpk", "pt", "ttpa", "tp", "ttp", "ch50", "c3", "c4", "dna", "rna",
    "hla", "ana", "anca", "hiv", "hcv", "hbv", "cmv", "ebv", "hsv", "vzv", "gt", "sd", "cv",
    "hba1c",
];

static CANONICAL_NAMES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| NAME_VARIANTS.iter().copied().collect());

/// Map a raw lab name onto its canonical series key.
///
/// Unknown names keep their text with only the first letter capitalized, so
/// repeated calls with the same input always land in the same column.
pub fn normalize_metric_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return UNKNOWN_METRIC.to_string();
    }

    let lowered = collapsed.to_lowercase();
    match CANONICAL_NAMES.get(lowered.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => capitalize_first(&lowered),
    }
}

/// Human-readable label for a canonical name: `"colesterol hdl"` -> `"Colesterol HDL"`.
pub fn metric_display_name(canonical: &str) -> String {
    let spaced = canonical.replace('_', " ");
    let words: Vec<String> = spaced
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.split('-')
                .map(format_word)
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect();

    if words.is_empty() {
        return "Desconhecido".to_string();
    }
    words.join(" ")
}

fn format_word(word: &str) -> String {
    if ACRONYMS.contains(&word) {
        word.to_uppercase()
    } else {
        capitalize_first(word)
    }
}

fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
