use crate::domain::verdict::ClassificationRequest;

pub fn classification_prompt(req: &ClassificationRequest) -> String {
    [
        "You are an AI fraud detection assistant for the securities market.",
        "Classify the given text into one of three categories:",
        "1. HIGH_RISK (fraud, scam, guaranteed returns, impersonation, fake apps/docs, pump-and-dump)",
        "2. WATCH (suspicious or unverified, requires further verification, rumours, speculative news, event invites)",
        "3. LIKELY_SAFE (legit corporate filings, normal analysis, regulatory circulars, official news)",
        "",
        "Return result in strict JSON:",
        "{",
        "  \"verdict\": \"HIGH_RISK\" | \"WATCH\" | \"LIKELY_SAFE\",",
        "  \"confidence\": 0-100,",
        "  \"reasons\": [\"short bullet points on why\"]",
        "}",
        "",
        "Keep it concise and professional. No extra text.",
        "",
        format!("Submission type: {}", req.category).as_str(),
        format!("Input: {}", req.content.trim()).as_str(),
    ]
    .join("\n")
}

pub fn announcement_prompt(text: &str) -> String {
    [
        "You are a compliance analyst. Assess the credibility of this corporate announcement:",
        format!("Text: \"{}\"", text.trim()).as_str(),
        "Return a compact JSON with fields { credibilityScore (0-100), verdict in \
         [\"HIGH RISK\",\"WATCH\",\"SAFE\"], reasoning (1-2 sentences) } only.",
    ]
    .join("\n")
}
