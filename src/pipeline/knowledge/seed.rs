/// Reference passages loaded into the in-memory index by default.
pub(super) const REFERENCE_CORPUS: &[(&str, &str)] = &[
    (
        "ref-acs-01",
        "Chest pain or pressure that spreads to the left arm, jaw or back, with shortness of breath, sweating or nausea, can signal a heart attack. Call emergency services immediately.",
    ),
    (
        "ref-stroke-01",
        "Sudden face droop, arm or leg weakness on one side of the body, or slurred speech are warning signs of stroke. Note the time symptoms started and call emergency services.",
    ),
    (
        "ref-dyspnea-01",
        "Difficulty breathing at rest, bluish lips or inability to speak full sentences requires urgent medical evaluation.",
    ),
    (
        "ref-fever-01",
        "A fever above 39 degrees or a fever lasting more than three days in an adult should be assessed by a healthcare professional.",
    ),
    (
        "ref-wound-01",
        "A wound that becomes red, warm, swollen or drains pus may be infected. Spreading redness or fever with a wound needs prompt medical review.",
    ),
    (
        "ref-cold-01",
        "The common cold causes runny nose, sneezing, sore throat and mild cough. It usually resolves within a week with rest and fluids.",
    ),
    (
        "ref-headache-01",
        "Mild tension headaches often respond to rest, hydration and over-the-counter pain relief. A sudden severe headache unlike any before needs emergency care.",
    ),
    (
        "ref-flu-01",
        "Influenza brings sudden fever, muscle aches, chills, cough and tiredness. Most people recover at home, but breathing difficulty or confusion require medical attention.",
    ),
    (
        "ref-meningitis-01",
        "Fever with a stiff neck, severe headache, sensitivity to light or a rash that does not fade under pressure may indicate meningitis and is an emergency.",
    ),
    (
        "ref-pneumonia-01",
        "Cough with fever, chest pain when breathing and shortness of breath can indicate pneumonia, which should be evaluated by a clinician.",
    ),
];
