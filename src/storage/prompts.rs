//! Instruction prefixes for documentation-writing records
//!
//! Each documented unit gets one record whose title is a randomly chosen
//! prefix followed by the undocumented code.

use rand::seq::SliceRandom;
use rand::Rng;

pub const DOCUMENTATION_PROMPTS: &[&str] = &[
    "write a docstring for this ",
    "can you generate documentation for this code ",
    "provide documentation for this ",
    "please write a docstring explaining this code ",
    "generate comments for this Python code ",
    "create documentation for this code snippet ",
    "add descriptive comments to this code ",
    "explain the purpose of this code with a docstring ",
    "generate documentation comments for this ",
    "help me understand this code with a docstring ",
    "write me some comments for this code ",
    "provide details about this code with a docstring ",
    "add explanations to this Python script ",
    "can you describe this code with a docstring ",
    "write a helpful docstring for this function ",
    "generate documentation for this Python file ",
    "add comments to clarify this code ",
    "create a docstring for this Python function ",
    "explain the functionality of this code with a docstring ",
    "write me documentation for this Python class ",
    "help me document this piece of code ",
    "provide details about this Python module ",
    "generate a docstring for this Python method ",
    "add comments to make this code more understandable ",
    "create a docstring explaining the logic of this code ",
    "write me a description for this Python code ",
    "generate comments to document this script ",
    "add a docstring to explain this code ",
    "help me with the documentation of this code ",
    "write a docstring to describe this function ",
    "generate documentation to explain this code ",
    "provide insights into this Python code with a docstring ",
    "add comments for better understanding of this code ",
    "create a docstring for this Python class method ",
    "write me some comments to annotate this code ",
    "generate documentation comments for this Python file ",
    "add descriptive comments to clarify this code ",
    "help me understand the purpose of this code with a docstring ",
    "write a docstring to detail the functionality of this code ",
    "generate comments to document the logic of this code ",
    "add explanations to this Python script with a docstring ",
    "create documentation for this Python function ",
    "explain the behavior of this code with a docstring ",
    "write me documentation comments for this Python module ",
    "provide details about this Python function with a docstring ",
    "generate documentation for this Python class ",
    "add comments to explain the flow of this code ",
    "help me document this Python class ",
    "write a docstring to describe the purpose of this code ",
    "generate documentation to explain the functionality of this code ",
    "add comments for better understanding of this Python script ",
    "create a docstring for this Python module ",
    "write me some comments to annotate this Python code ",
    "generate documentation comments for this Python method ",
    "add descriptive comments to clarify this Python code ",
    "help me understand the logic of this code with a docstring ",
    "write a docstring to detail the behavior of this Python code ",
    "generate comments to document the purpose of this code ",
    "add explanations to this Python function with a docstring ",
    "create documentation for this Python class method ",
    "explain the structure of this code with a docstring ",
    "write me documentation comments for this Python file ",
    "provide details about this Python script with a docstring ",
    "generate documentation for this Python function ",
    "add comments to explain the functionality of this code ",
    "help me document this Python module ",
    "write a docstring to describe the logic of this Python code ",
    "generate documentation to explain the purpose of this code ",
    "add comments for better understanding of this Python function ",
    "create a docstring for this Python class ",
    "write me some comments to annotate this Python script ",
    "generate documentation comments for this Python class method ",
    "add descriptive comments to clarify this Python function ",
    "help me understand the behavior of this code with a docstring ",
    "write a docstring to detail the structure of this Python code ",
    "generate comments to document the behavior of this Python code ",
    "add explanations to this Python module with a docstring ",
    "create documentation for this Python class ",
    "write me documentation comments for this Python function ",
    "provide details about this Python class with a docstring ",
    "generate documentation for this Python script ",
    "add comments to explain the purpose of this Python code ",
    "help me document this Python class method ",
    "write a docstring to describe the flow of this Python code ",
    "generate documentation to explain the logic of this Python code ",
    "add comments for better understanding of this Python module ",
    "write me some comments to annotate this Python class ",
    "add descriptive comments to clarify this Python module ",
    "help me understand the purpose of this Python function with a docstring ",
    "write a docstring to detail the functionality of this Python class ",
    "generate comments to document the structure of this Python code ",
    "add explanations to this Python code with a docstring ",
    "create documentation for this Python module ",
    "explain the behavior of this Python code with a docstring ",
    "write me documentation comments for this Python script ",
    "provide details about this Python module with a docstring ",
    "generate documentation for this Python class method ",
    "add comments to explain the flow of this Python code ",
    "help me document this Python function ",
    "write a docstring to describe the purpose of this Python module ",
    "generate documentation to explain the functionality of this Python class ",
    "add comments for better understanding of this Python class method ",
    "create a docstring for this Python script ",
    "write me some comments to annotate this Python function ",
    "generate documentation comments for this Python class ",
    "add descriptive comments to clarify this Python class method ",
    "help me understand the logic of this Python code with a docstring ",
    "write a docstring to detail the behavior of this Python function ",
    "generate comments to document the purpose of this Python module ",
    "explain the structure of this Python code with a docstring ",
    "generate documentation for this Python module ",
    "add comments to explain the functionality of this Python class ",
    "write a docstring to describe the logic of this Python class method ",
    "generate documentation to explain the purpose of this Python function ",
    "write me some comments to annotate this Python module ",
    "help me understand the behavior of this Python code with a docstring ",
    "write a docstring to detail the structure of this Python class ",
    "generate comments to document the behavior of this Python class method ",
    "explain the functionality of this Python code with a docstring ",
    "write a docstring to describe the flow of this Python class ",
    "generate documentation to explain the logic of this Python class method ",
    "write me some comments to annotate this Python class method ",
];

/// Picks one prefix uniformly at random
pub fn choose_prompt<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    DOCUMENTATION_PROMPTS
        .choose(rng)
        .copied()
        .unwrap_or(DOCUMENTATION_PROMPTS[0])
}
