/// `(symptom, pattern, PART_OF weight)`
pub(super) const PART_OF: &[(&str, &str, f32)] = &[
    ("chest pain", "acute coronary pattern", 0.9),
    ("left arm pain", "acute coronary pattern", 0.8),
    ("shortness of breath", "acute coronary pattern", 0.7),
    ("sweating", "acute coronary pattern", 0.6),
    ("slurred speech", "focal neurological pattern", 0.9),
    ("face droop", "focal neurological pattern", 0.9),
    ("weakness on one side", "focal neurological pattern", 0.85),
    ("cough", "lower respiratory pattern", 0.7),
    ("fever", "lower respiratory pattern", 0.6),
    ("shortness of breath", "lower respiratory pattern", 0.6),
    ("chest pain", "lower respiratory pattern", 0.4),
    ("fever", "febrile viral pattern", 0.7),
    ("muscle aches", "febrile viral pattern", 0.6),
    ("cough", "febrile viral pattern", 0.5),
    ("fatigue", "febrile viral pattern", 0.5),
    ("runny nose", "upper respiratory pattern", 0.8),
    ("sneezing", "upper respiratory pattern", 0.7),
    ("sore throat", "upper respiratory pattern", 0.6),
    ("cough", "upper respiratory pattern", 0.4),
    ("wound redness", "skin infection pattern", 0.8),
    ("pus", "skin infection pattern", 0.8),
    ("swelling", "skin infection pattern", 0.6),
    ("fever", "skin infection pattern", 0.4),
    ("stiff neck", "meningeal pattern", 0.9),
    ("severe headache", "meningeal pattern", 0.8),
    ("light sensitivity", "meningeal pattern", 0.7),
    ("fever", "meningeal pattern", 0.6),
    ("mild headache", "tension pattern", 0.7),
    ("neck tension", "tension pattern", 0.5),
];

/// `(pattern, disease, INDICATES confidence)`
pub(super) const INDICATES: &[(&str, &str, f32)] = &[
    ("acute coronary pattern", "myocardial infarction", 0.95),
    ("focal neurological pattern", "stroke", 0.95),
    ("lower respiratory pattern", "pneumonia", 0.8),
    ("febrile viral pattern", "influenza", 0.75),
    ("upper respiratory pattern", "common cold", 0.85),
    ("skin infection pattern", "cellulitis", 0.8),
    ("meningeal pattern", "meningitis", 0.9),
    ("tension pattern", "tension headache", 0.7),
];

/// `(disease, stored urgency)`
pub(super) const DISEASES: &[(&str, &str)] = &[
    ("myocardial infarction", "CRITICAL"),
    ("stroke", "CRITICAL"),
    ("pneumonia", "HIGH"),
    ("influenza", "MODERATE"),
    ("common cold", "LOW"),
    ("cellulitis", "MODERATE"),
    ("meningitis", "CRITICAL"),
    ("tension headache", "LOW"),
];
