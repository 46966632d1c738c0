use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Names available in every Python module without an import: the contents of
/// `builtins` plus the implicit module attributes.
pub static PYTHON_BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Functions
        "abs", "aiter", "all", "anext", "any", "ascii", "bin", "breakpoint", "callable", "chr",
        "compile", "delattr", "dir", "divmod", "eval", "exec", "format", "getattr", "globals",
        "hasattr", "hash", "help", "hex", "id", "input", "isinstance", "issubclass", "iter",
        "len", "locals", "max", "min", "next", "oct", "open", "ord", "pow", "print", "repr",
        "round", "setattr", "sorted", "sum", "vars", "__import__", "__build_class__",
        // Types
        "bool", "bytearray", "bytes", "classmethod", "complex", "dict", "enumerate", "filter",
        "float", "frozenset", "int", "list", "map", "memoryview", "object", "property", "range",
        "reversed", "set", "slice", "staticmethod", "str", "super", "tuple", "type", "zip",
        // Constants
        "True", "False", "None", "Ellipsis", "NotImplemented", "__debug__", "copyright",
        "credits", "license", "exit", "quit",
        // Exceptions
        "BaseException", "BaseExceptionGroup", "Exception", "ExceptionGroup",
        "ArithmeticError", "AssertionError", "AttributeError", "BlockingIOError",
        "BrokenPipeError", "BufferError", "ChildProcessError", "ConnectionAbortedError",
        "ConnectionError", "ConnectionRefusedError", "ConnectionResetError", "EOFError",
        "EnvironmentError", "FileExistsError", "FileNotFoundError", "FloatingPointError",
        "GeneratorExit", "IOError", "ImportError", "IndentationError", "IndexError",
        "InterruptedError", "IsADirectoryError", "KeyError", "KeyboardInterrupt", "LookupError",
        "MemoryError", "ModuleNotFoundError", "NameError", "NotADirectoryError",
        "NotImplementedError", "OSError", "OverflowError", "PermissionError",
        "ProcessLookupError", "RecursionError", "ReferenceError", "RuntimeError",
        "StopAsyncIteration", "StopIteration", "SyntaxError", "SystemError", "SystemExit",
        "TabError", "TimeoutError", "TypeError", "UnboundLocalError", "UnicodeDecodeError",
        "UnicodeEncodeError", "UnicodeError", "UnicodeTranslateError", "ValueError",
        "ZeroDivisionError", "EncodingWarning",
        // Warnings
        "BytesWarning", "DeprecationWarning", "FutureWarning", "ImportWarning",
        "PendingDeprecationWarning", "ResourceWarning", "RuntimeWarning", "SyntaxWarning",
        "UnicodeWarning", "UserWarning", "Warning",
        // Module attributes
        "__name__", "__doc__", "__file__", "__package__", "__spec__", "__loader__",
        "__builtins__", "__annotations__", "__dict__", "__class__",
    ]
    .into_iter()
    .collect()
});

pub fn is_builtin(name: &str) -> bool {
    PYTHON_BUILTINS.contains(name)
}
