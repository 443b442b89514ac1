/// Instruction sent with every comparison. Image 1 is the reference, image 2
/// the suspect; the order of the image parts in the request must match.
pub const COMPARISON_PROMPT: &str = "\
Analyze these two images carefully:
Image 1 is provided as the reference/original image.
Image 2 is a suspected deepfake or manipulated version.

IMPORTANT: First determine if these are images of the same person or different people.
If they are clearly different people, immediately identify this as a deepfake or manipulation.

Perform a detailed analysis comparing them:
1. Check if the faces appear to be the same person - different people means it's a deepfake
2. Identify signs of manipulation in the second image
3. Check for inconsistencies in lighting, shadows, and reflections
4. Look for unnatural edges, blurring, or artifacts
5. Examine facial proportions and features (eyes, nose, mouth, jawline)
6. Assess texture inconsistencies

Conclude with:
1. A determination if the second image appears to be a deepfake or manipulated (yes/no)
2. Confidence level (low/medium/high)
3. Brief explanation of your reasoning

If the images show completely different people, the answer MUST be \"yes\" (it is a deepfake) with high confidence.

Format your response with clear headings and be as specific as possible.
";

/// Short prompt used by the connectivity check.
pub const CONNECTIVITY_PROMPT: &str = "Hello, I'm testing the Gemini API. \
Please respond with a brief confirmation that the API is working correctly.";
