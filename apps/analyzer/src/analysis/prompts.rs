// All LLM prompt constants for the analysis pipeline.

/// System prompt for job description structuring — enforces JSON-only output.
pub const JOB_PARSE_SYSTEM: &str =
    "You are an expert job description parser. \
    Extract structured requirements from a job posting. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Job structuring prompt template. Replace `{job_text}` before sending.
pub const JOB_PARSE_PROMPT_TEMPLATE: &str = r#"Parse the following job description and extract structured requirements.

Return a JSON object with this EXACT schema (no extra fields):
{
  "job_title": "Senior Backend Engineer",
  "required_skills": ["python", "fastapi", "docker"],
  "preferred_skills": ["kubernetes", "terraform"],
  "required_years": 5,
  "role_type": "senior"
}

Rules for parsing:

REQUIRED SKILLS: Explicit must-haves — phrases like "required", "must have", "you will need".
PREFERRED SKILLS: Nice-to-haves — phrases like "preferred", "bonus", "nice to have", "a plus".
Normalize skill names (e.g., "React.js" -> "react", "K8s" -> "kubernetes"), lowercase.

REQUIRED_YEARS: Minimum years of experience as a number. Use 0 if not specified.

ROLE_TYPE (pick exactly one): "entry", "mid", "senior", "lead", "principal".

If a field has no information in the posting, use an empty list, 0, or null as appropriate.

JOB DESCRIPTION:
{job_text}"#;

/// System prompt for CV structuring — enforces JSON-only output.
pub const CV_PARSE_SYSTEM: &str =
    "You are an expert CV/resume parser. \
    Extract structured candidate data from a CV. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// CV structuring prompt template. Replace `{cv_text}` before sending.
pub const CV_PARSE_PROMPT_TEMPLATE: &str = r#"Parse the following CV and extract structured candidate data.

Return a JSON object with this EXACT schema (no extra fields):
{
  "candidate_name": "Jane Doe",
  "skills": ["python", "postgresql", "aws"],
  "years_experience": 6.5
}

Rules for parsing:

SKILLS: All technical and soft skills mentioned anywhere in the CV.
Normalize skill names (e.g., "React.js" -> "react", "K8s" -> "kubernetes"), lowercase.

YEARS_EXPERIENCE: Total years of professional experience, calculated accurately
from the work-history date ranges. Use 0 if no work history is present.

If a field has no information in the CV, use an empty list, 0, or null as appropriate.

CV:
{cv_text}"#;

/// System prompt for semantic validation — enforces JSON-only output.
pub const SEMANTIC_SYSTEM: &str =
    "You are an expert technical recruiter with deep understanding of skill \
    transferability and cultural fit. \
    Analyze a candidate CV against job requirements, considering semantic skill \
    matches not caught by keyword comparison (synonyms, related technologies, \
    transferable skills such as Java -> C# or AWS -> Azure) and soft-skill \
    indicators (leadership, collaboration, communication, growth mindset). \
    Be objective but considerate; focus on actionable insights. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Semantic validation prompt template.
/// Replace: {skill_match}, {matched_skills}, {missing_skills},
///          {experience_alignment}, {job_text}, {cv_text}
pub const SEMANTIC_PROMPT_TEMPLATE: &str = r#"A deterministic keyword comparison has already been run. Use it as your baseline: credit transferable or semantically equivalent skills it missed, and ground your soft-skill judgment in the texts below.

DETERMINISTIC BASELINE:
- Skill Match: {skill_match}%
- Matched Skills: {matched_skills}
- Missing Skills: {missing_skills}
- Experience Alignment: {experience_alignment}%

JOB DESCRIPTION:
{job_text}

CANDIDATE CV:
{cv_text}

Return a JSON object with this EXACT schema (no extra fields):
{
  "semantic_match_percent": 72.0,
  "soft_skills_match_percent": 80.0,
  "reasoning": "<brief explanation>",
  "transferable_skills": ["skill1", "skill2"],
  "cultural_fit_notes": "<observations>"
}

Both percent fields MUST be numbers between 0 and 100."#;

/// System prompt for recommendation synthesis — enforces JSON-only output.
pub const REPORT_SYSTEM: &str =
    "You are an expert career coach and technical recruiter. \
    Generate specific, actionable CV-improvement recommendations. \
    Each recommendation must say what to do and why it matters for this role. \
    Be constructive and encouraging. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Recommendation synthesis prompt template.
/// Replace: {final_score}, {grade}, {skill_match}, {missing_skills},
///          {semantic_match}, {reasoning}, {job_title}, {required_skills},
///          {required_years}, {role_type}, {candidate_years}, {candidate_skills}
pub const REPORT_PROMPT_TEMPLATE: &str = r#"Generate actionable recommendations to improve this candidate's match for this role.

ANALYSIS RESULTS:
Final Score: {final_score}/100 (Grade: {grade})

Deterministic analysis:
- Skill Match: {skill_match}%
- Missing Skills: {missing_skills}

Semantic analysis:
- Semantic Match: {semantic_match}%
- Reasoning: {reasoning}

JOB REQUIREMENTS:
Title: {job_title}
Required Skills: {required_skills}
Experience: {required_years} years
Level: {role_type}

CANDIDATE PROFILE:
Total Experience: {candidate_years} years
Skills: {candidate_skills}

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "<2-3 sentence overview of the match>",
  "recommendations": [
    {
      "category": "add",
      "priority": "high",
      "description": "<specific action>",
      "rationale": "<why this matters for this role>"
    }
  ]
}

CATEGORY (pick exactly one per recommendation): "add", "remove", "modify", "emphasize".
PRIORITY (pick exactly one per recommendation): "high", "medium", "low".

Produce at least 5 recommendations, ordered from highest to lowest priority."#;
